// ── `profiles` table endpoint ──

use super::client::RestClient;
use super::types::ProfileRow;
use crate::error::Error;

impl RestClient {
    /// Look up the profile of an identity-provider user.
    ///
    /// `Ok(None)` when the user has no profile row yet.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, Error> {
        let params = [
            ("select", "*".to_owned()),
            ("user_id", format!("eq.{user_id}")),
            ("limit", "1".to_owned()),
        ];
        let rows: Vec<ProfileRow> = self.get_with_params("profiles", &params).await?;
        Ok(rows.into_iter().next())
    }
}
