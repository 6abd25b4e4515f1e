// ── `entities` table endpoints ──

use super::client::RestClient;
use super::query::EntityQuery;
use super::types::{EntityPatch, EntityRow, NewEntityRow};
use crate::error::Error;

const TABLE: &str = "entities";

fn id_filter(id: &str) -> Vec<(&'static str, String)> {
    vec![("id", format!("eq.{id}"))]
}

fn single(rows: Vec<EntityRow>, id: &str) -> Result<EntityRow, Error> {
    rows.into_iter().next().ok_or_else(|| Error::NotFound {
        resource: "entity",
        identifier: id.to_owned(),
    })
}

impl RestClient {
    /// Fetch every row matching the query.
    pub async fn list_entities(&self, query: &EntityQuery) -> Result<Vec<EntityRow>, Error> {
        self.get_with_params(TABLE, &query.to_params()).await
    }

    /// Point lookup by id.
    pub async fn get_entity(&self, id: &str) -> Result<EntityRow, Error> {
        let rows: Vec<EntityRow> = self
            .get_with_params(TABLE, &EntityQuery::by_id(id).to_params())
            .await?;
        single(rows, id)
    }

    /// Insert one row, returning it with its store-assigned id.
    pub async fn insert_entity(&self, row: &NewEntityRow) -> Result<EntityRow, Error> {
        let rows: Vec<EntityRow> = self.post_returning(TABLE, row).await?;
        rows.into_iter().next().ok_or_else(|| Error::Deserialization {
            message: "insert returned no representation".into(),
            body: String::new(),
        })
    }

    pub async fn update_entity(&self, id: &str, patch: &EntityPatch) -> Result<EntityRow, Error> {
        let rows: Vec<EntityRow> = self.patch_returning(TABLE, &id_filter(id), patch).await?;
        single(rows, id)
    }

    pub async fn delete_entity(&self, id: &str) -> Result<(), Error> {
        let rows: Vec<EntityRow> = self.delete_returning(TABLE, &id_filter(id)).await?;
        single(rows, id).map(|_| ())
    }
}
