// ── Runtime connection configuration ──
//
// These types describe *how* to reach the entity store and how the
// controller should behave. They carry credential data and tuning, but
// never touch disk: the CLI builds a `ControllerConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::hierarchy::OrphanPolicy;

/// Credentials presented to the entity store.
#[derive(Debug, Clone)]
pub struct AuthCredentials {
    /// Project API key, sent as `apikey`.
    pub api_key: SecretString,
    /// Access token from the identity provider. Falls back to the API key.
    pub access_token: Option<SecretString>,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-hosted stores with self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one controller instance.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Store URL (e.g., `https://project.example.co`).
    pub url: Url,
    pub auth: AuthCredentials,
    /// Identity-provider user id. `None` runs with full (service) access.
    pub user_id: Option<String>,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// How often to perform a full refresh (seconds). 0 = never.
    pub refresh_interval_secs: u64,
    /// Dashboard summary recompute period. Zero disables the task.
    pub summary_interval: Duration,
    pub orphan_policy: OrphanPolicy,
}

impl ControllerConfig {
    pub fn new(url: Url, api_key: SecretString) -> Self {
        Self {
            url,
            auth: AuthCredentials {
                api_key,
                access_token: None,
            },
            user_id: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh_interval_secs: 0,
            summary_interval: Duration::from_secs(30),
            orphan_policy: OrphanPolicy::default(),
        }
    }
}
