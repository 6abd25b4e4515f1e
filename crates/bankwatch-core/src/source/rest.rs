// ── REST-backed entity source ──

use bankwatch_api::transport::{TlsMode, TransportConfig};
use bankwatch_api::{Credentials, EntityPatch, EntityQuery, NewEntityRow, RestClient};
use tracing::debug;

use super::EntitySource;
use crate::config::{ControllerConfig, TlsVerification};
use crate::convert::{configs_from_rows, entities_from_rows};
use crate::error::CoreError;
use crate::model::{Entity, EntityId, EntityUpdate, HierarchyConfig, NewEntity, UserContext};

/// The hosted store, reached over its REST API.
#[derive(Clone)]
pub struct RestSource {
    client: RestClient,
}

impl RestSource {
    pub fn new(config: &ControllerConfig) -> Result<Self, CoreError> {
        let mut credentials = Credentials::new(config.auth.api_key.clone());
        if let Some(token) = &config.auth.access_token {
            credentials = credentials.with_access_token(token.clone());
        }
        let client = RestClient::new(config.url.as_str(), &credentials, &build_transport(config))?;
        debug!(base = %client.base_url(), "rest source ready");
        Ok(Self { client })
    }

    pub fn from_client(client: RestClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }
}

impl EntitySource for RestSource {
    async fn list_entities(&self, query: &EntityQuery) -> Result<Vec<Entity>, CoreError> {
        let rows = self.client.list_entities(query).await?;
        Ok(entities_from_rows(rows))
    }

    async fn get_entity(&self, id: &EntityId) -> Result<Entity, CoreError> {
        let row = self.client.get_entity(&id.to_string()).await?;
        Entity::try_from(row)
    }

    async fn list_hierarchy_configs(
        &self,
        customer_ids: Option<&[EntityId]>,
    ) -> Result<Vec<HierarchyConfig>, CoreError> {
        let ids: Option<Vec<String>> =
            customer_ids.map(|ids| ids.iter().map(ToString::to_string).collect());
        let rows = self.client.list_hierarchy_configs(ids.as_deref()).await?;
        Ok(configs_from_rows(rows))
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserContext>, CoreError> {
        Ok(self.client.get_profile(user_id).await?.map(UserContext::from))
    }

    async fn insert_entity(&self, entity: &NewEntity) -> Result<Entity, CoreError> {
        let row = self.client.insert_entity(&NewEntityRow::from(entity)).await?;
        Entity::try_from(row)
    }

    async fn update_entity(
        &self,
        id: &EntityId,
        update: &EntityUpdate,
    ) -> Result<Entity, CoreError> {
        let row = self
            .client
            .update_entity(&id.to_string(), &EntityPatch::from(update))
            .await?;
        Entity::try_from(row)
    }

    async fn delete_entity(&self, id: &EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_entity(&id.to_string()).await?)
    }

    async fn insert_hierarchy_config(
        &self,
        config: &HierarchyConfig,
    ) -> Result<HierarchyConfig, CoreError> {
        let row = self.client.insert_hierarchy_config(&config.into()).await?;
        HierarchyConfig::try_from(row)
    }
}

/// Build a [`TransportConfig`] from the controller configuration.
fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
