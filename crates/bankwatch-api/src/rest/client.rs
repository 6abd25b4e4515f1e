// Async HTTP client for the entity store's REST surface.
//
// Base path: /rest/v1/
// Auth: `apikey` + `Authorization: Bearer` default headers

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::TransportConfig;

// ── Error response shape from the store ──────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

const RETURN_REPRESENTATION: &str = "return=representation";

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the entity store.
///
/// Every table endpoint lives under `/rest/v1/{table}`. Endpoint methods
/// (entities, hierarchy configs, profiles) are inherent methods defined in
/// sibling modules; this module only owns transport mechanics.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from credentials and a transport config.
    ///
    /// Injects `apikey` and `Authorization` as default headers.
    pub fn new(
        base_url: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client_with_headers(credentials.headers()?)?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Append `/rest/v1/` unless the URL already points there.
    ///
    /// `https://project.example.co` → `https://project.example.co/rest/v1/`
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/rest/v1") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/rest/v1/"));
        }

        Ok(url)
    }

    /// The normalized `/rest/v1/` base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, table: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(table)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(table)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    /// POST a row and return the stored representation.
    pub(crate) async fn post_returning<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(table)?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// PATCH the rows matching `params` and return their new representation.
    pub(crate) async fn patch_returning<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: &str,
        params: &[(&str, String)],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(table)?;
        debug!("PATCH {url} params={params:?}");

        let resp = self
            .http
            .patch(url)
            .query(params)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// DELETE the rows matching `params` and return what was removed.
    pub(crate) async fn delete_returning<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(table)?;
        debug!("DELETE {url} params={params:?}");

        let resp = self
            .http
            .delete(url)
            .query(params)
            .header("Prefer", RETURN_REPRESENTATION)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorResponse>(&raw).ok();
        let message = parsed
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.clone()
                }
            });

        match status {
            reqwest::StatusCode::UNAUTHORIZED => Error::Authentication { message },
            reqwest::StatusCode::FORBIDDEN => Error::PermissionDenied { message },
            _ => {
                let (code, details, hint) = parsed
                    .map(|e| (e.code, e.details, e.hint))
                    .unwrap_or_default();
                Error::Store {
                    message,
                    code,
                    details,
                    hint,
                    status: status.as_u16(),
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_rest_prefix() {
        let url = RestClient::normalize_base_url("https://project.example.co").unwrap();
        assert_eq!(url.as_str(), "https://project.example.co/rest/v1/");
    }

    #[test]
    fn base_url_keeps_existing_prefix() {
        let url = RestClient::normalize_base_url("https://project.example.co/rest/v1/").unwrap();
        assert_eq!(url.as_str(), "https://project.example.co/rest/v1/");
    }

    #[test]
    fn base_url_preserves_subpath() {
        let url = RestClient::normalize_base_url("http://localhost:54321/store").unwrap();
        assert_eq!(url.as_str(), "http://localhost:54321/store/rest/v1/");
    }
}
