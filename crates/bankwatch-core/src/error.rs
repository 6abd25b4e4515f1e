// ── Core error types ──
//
// User-facing errors from bankwatch-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<bankwatch_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to entity store at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller disconnected")]
    ControllerDisconnected,

    #[error("Entity store request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Entity {id} references missing parent {parent_id}")]
    OrphanedEntity { id: String, parent_id: String },

    #[error("Parent chain of {id} does not terminate at a root (cycle or depth > {max_depth})")]
    HierarchyCycle { id: String, max_depth: usize },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// The store's error code (a Postgres SQLSTATE for constraint failures).
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Orphans and cycles: the stored data itself is inconsistent.
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, Self::OrphanedEntity { .. } | Self::HierarchyCycle { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<bankwatch_api::Error> for CoreError {
    fn from(err: bankwatch_api::Error) -> Self {
        match err {
            bankwatch_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            bankwatch_api::Error::PermissionDenied { message } => {
                CoreError::AccessDenied { message }
            }
            bankwatch_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            bankwatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            bankwatch_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            bankwatch_api::Error::NotFound {
                resource,
                identifier,
            } => CoreError::NotFound {
                entity_type: resource.into(),
                identifier,
            },
            bankwatch_api::Error::Store {
                message,
                code,
                details,
                status,
                ..
            } => {
                // SQLSTATE class 23: the store refused the write on a constraint.
                if code.as_deref().is_some_and(|c| c.starts_with("23")) {
                    let message = match details {
                        Some(d) => format!("{message} ({d})"),
                        None => message,
                    };
                    CoreError::Conflict { message }
                } else {
                    CoreError::Api {
                        message,
                        code,
                        status: Some(status),
                    }
                }
            }
            bankwatch_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violation_becomes_conflict() {
        let api = bankwatch_api::Error::Store {
            message: "violates foreign key constraint".into(),
            code: Some("23503".into()),
            details: Some("Key is still referenced".into()),
            hint: None,
            status: 409,
        };
        let core = CoreError::from(api);
        let CoreError::Conflict { message } = &core else {
            panic!("expected a conflict, got {core:?}");
        };
        assert!(message.contains("still referenced"));
    }

    #[test]
    fn other_store_errors_stay_api_errors() {
        let api = bankwatch_api::Error::Store {
            message: "relation does not exist".into(),
            code: Some("42P01".into()),
            details: None,
            hint: None,
            status: 404,
        };
        assert!(matches!(
            CoreError::from(api),
            CoreError::Api {
                status: Some(404),
                ..
            }
        ));
    }

    #[test]
    fn permission_denied_maps_to_access_denied() {
        let api = bankwatch_api::Error::PermissionDenied {
            message: "row-level security".into(),
        };
        assert!(matches!(CoreError::from(api), CoreError::AccessDenied { .. }));
    }

    #[test]
    fn integrity_classification() {
        assert!(
            CoreError::HierarchyCycle {
                id: "a".into(),
                max_depth: 16
            }
            .is_data_integrity()
        );
        assert!(
            !CoreError::ValidationFailed {
                message: "x".into()
            }
            .is_data_integrity()
        );
    }
}
