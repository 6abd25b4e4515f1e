use thiserror::Error;

/// Top-level error type for the `bankwatch-api` crate.
///
/// Covers every failure mode of the entity store's REST surface:
/// authentication, transport, structured store errors, and decoding.
/// `bankwatch-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The store rejected the API key or access token (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The credentials are valid but row-level security denied the request (HTTP 403).
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Store ───────────────────────────────────────────────────────
    /// Structured error returned by the store (`{message, code, details, hint}`).
    #[error("Store error (HTTP {status}): {message}")]
    Store {
        message: String,
        code: Option<String>,
        details: Option<String>,
        hint: Option<String>,
        status: u16,
    },

    /// A single-row request matched nothing.
    #[error("{resource} not found: {identifier}")]
    NotFound {
        resource: &'static str,
        identifier: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Store { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the store rejected the write because of a
    /// foreign-key or uniqueness constraint.
    pub fn is_constraint_violation(&self) -> bool {
        // Postgres SQLSTATE class 23: integrity constraint violation.
        matches!(self, Self::Store { code: Some(code), .. } if code.starts_with("23"))
    }

    /// Extract the store's error code, if available.
    pub fn store_error_code(&self) -> Option<&str> {
        match self {
            Self::Store { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_error(code: &str, status: u16) -> Error {
        Error::Store {
            message: "boom".into(),
            code: Some(code.into()),
            details: None,
            hint: None,
            status,
        }
    }

    #[test]
    fn foreign_key_violation_is_constraint_violation() {
        assert!(store_error("23503", 409).is_constraint_violation());
        assert!(!store_error("42501", 403).is_constraint_violation());
    }

    #[test]
    fn not_found_variants() {
        let err = Error::NotFound {
            resource: "entity",
            identifier: "z1".into(),
        };
        assert!(err.is_not_found());
        assert!(store_error("PGRST116", 404).is_not_found());
        assert_eq!(store_error("PGRST116", 404).store_error_code(), Some("PGRST116"));
    }
}
