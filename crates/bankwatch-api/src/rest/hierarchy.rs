// ── `hierarchy_configs` table endpoints ──

use super::client::RestClient;
use super::query::in_list;
use super::types::{HierarchyConfigRow, NewHierarchyConfigRow};
use crate::error::Error;

const TABLE: &str = "hierarchy_configs";

impl RestClient {
    /// Fetch hierarchy configs, optionally restricted to a set of customers.
    pub async fn list_hierarchy_configs(
        &self,
        customer_ids: Option<&[String]>,
    ) -> Result<Vec<HierarchyConfigRow>, Error> {
        let mut params = vec![("select", "*".to_owned())];
        if let Some(ids) = customer_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            params.push(("customer_id", in_list(ids)));
        }
        self.get_with_params(TABLE, &params).await
    }

    /// The config of one customer, if it has one.
    pub async fn get_hierarchy_config(
        &self,
        customer_id: &str,
    ) -> Result<Option<HierarchyConfigRow>, Error> {
        let params = [
            ("select", "*".to_owned()),
            ("customer_id", format!("eq.{customer_id}")),
            ("limit", "1".to_owned()),
        ];
        let rows: Vec<HierarchyConfigRow> = self.get_with_params(TABLE, &params).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn insert_hierarchy_config(
        &self,
        row: &NewHierarchyConfigRow,
    ) -> Result<HierarchyConfigRow, Error> {
        let rows: Vec<HierarchyConfigRow> = self.post_returning(TABLE, row).await?;
        rows.into_iter().next().ok_or_else(|| Error::Deserialization {
            message: "insert returned no representation".into(),
            body: String::new(),
        })
    }
}
