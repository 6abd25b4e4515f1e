//! CLI configuration: thin wrapper around `bankwatch_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --api-key, --user, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use bankwatch_core::{ControllerConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use bankwatch_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_api_key,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ControllerConfig` from the config file, profile, and CLI overrides.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, global);
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() {
        let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    // No profile: build from flags / env vars alone.
    let url_str = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = bankwatch_config::parse_url(url_str)?;

    let api_key = global
        .api_key
        .clone()
        .map(SecretString::from)
        .ok_or(CliError::NoCredentials {
            profile: profile_name,
        })?;

    let mut config = ControllerConfig::new(url, api_key);
    apply_overrides(&mut config, global);
    Ok(config)
}

/// Translate a `Profile` + global flags into a `ControllerConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<ControllerConfig, CliError> {
    // A flag-supplied key means the profile's credential chain is skipped.
    let mut config = if let Some(ref key) = global.api_key {
        let url = bankwatch_config::parse_url(global.url.as_deref().unwrap_or(&profile.url))?;
        let mut config = ControllerConfig::new(url, SecretString::from(key.clone()));
        config.auth.access_token = bankwatch_config::resolve_access_token(profile);
        config.user_id.clone_from(&profile.user_id);
        if let Some(ref ca_path) = profile.ca_cert {
            config.tls = TlsVerification::CustomCa(ca_path.clone());
        }
        if let Some(secs) = profile.summary_interval {
            config.summary_interval = Duration::from_secs(secs);
        }
        config.orphan_policy = profile.orphan_policy.unwrap_or_default();
        config
    } else {
        let mut config = bankwatch_config::profile_to_controller_config(profile, profile_name)?;
        if let Some(ref url) = global.url {
            config.url = bankwatch_config::parse_url(url)?;
        }
        config
    };

    if profile.insecure.unwrap_or(false) {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    apply_overrides(&mut config, global);
    Ok(config)
}

fn apply_overrides(config: &mut ControllerConfig, global: &GlobalOpts) {
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(ref user) = global.user {
        config.user_id = Some(user.clone());
    }
    config.timeout = Duration::from_secs(global.timeout);
}
