use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Credentials presented to the entity store on every request.
///
/// The store expects its project key in the `apikey` header and a bearer
/// token in `Authorization`. The bearer is the signed-in user's access
/// token when one is available (so row-level security sees the user),
/// otherwise the project key itself.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Project API key (anon or service key).
    pub api_key: SecretString,
    /// Access token issued by the identity provider for the current user.
    pub access_token: Option<SecretString>,
}

impl Credentials {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            access_token: None,
        }
    }

    #[must_use]
    pub fn with_access_token(mut self, token: SecretString) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Build the default header map carrying both credentials.
    ///
    /// Header values are marked sensitive so they never show up in
    /// `Debug` output or request logs.
    pub fn headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();

        let mut key = HeaderValue::from_str(self.api_key.expose_secret()).map_err(|e| {
            Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            }
        })?;
        key.set_sensitive(true);
        headers.insert("apikey", key);

        let bearer = self
            .access_token
            .as_ref()
            .unwrap_or(&self.api_key)
            .expose_secret();
        let mut auth = HeaderValue::from_str(&format!("Bearer {bearer}")).map_err(|e| {
            Error::Authentication {
                message: format!("invalid access token header value: {e}"),
            }
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Ok(headers)
    }
}
