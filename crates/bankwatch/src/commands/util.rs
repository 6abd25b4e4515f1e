//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use bankwatch_core::{Controller, Entity, EntityId, EntityType, Metadata};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Connect, with a spinner on interactive terminals.
pub async fn connect(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    if global.quiet || !std::io::stderr().is_terminal() {
        controller.connect().await?;
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Fetching hierarchy...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = controller.connect().await;
    spinner.finish_and_clear();
    result?;
    Ok(())
}

/// Resolve an entity by ID, or by exact (case-insensitive) name when
/// that name is unique among visible entities.
pub fn resolve_entity(controller: &Controller, identifier: &str) -> Result<Arc<Entity>, CliError> {
    if let Ok(entity) = controller.entity(&EntityId::from(identifier)) {
        return Ok(entity);
    }

    let snap = controller.store().entities_snapshot();
    let mut matches = snap
        .iter()
        .filter(|e| e.name.eq_ignore_ascii_case(identifier));
    match (matches.next(), matches.next()) {
        (Some(entity), None) => Ok(Arc::clone(entity)),
        (Some(_), Some(_)) => Err(CliError::Validation {
            field: "entity".into(),
            reason: format!("name '{identifier}' is ambiguous, use the entity ID"),
        }),
        (None, _) => Err(CliError::NotFound {
            resource_type: "entity".into(),
            identifier: identifier.into(),
            list_command: "entities list".into(),
        }),
    }
}

pub fn parse_entity_type(raw: &str) -> Result<EntityType, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "type".into(),
        reason: format!("unknown entity type '{raw}'"),
    })
}

/// Split `KEY=VALUE` pairs from `--meta` flags.
pub fn parse_meta_pairs(pairs: &[String]) -> Result<Vec<(String, String)>, CliError> {
    pairs
        .iter()
        .map(|pair| {
            let (key, value) = pair.split_once('=').ok_or_else(|| CliError::Validation {
                field: "meta".into(),
                reason: format!("expected KEY=VALUE, got '{pair}'"),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Validation {
                    field: "meta".into(),
                    reason: format!("empty key in '{pair}'"),
                });
            }
            Ok((key.to_owned(), value.to_owned()))
        })
        .collect()
}

/// Metadata for `entity_type`: `base` (or empty, or the JSON file when
/// given) with the `--meta` pairs applied on top.
pub fn build_metadata(
    entity_type: EntityType,
    base: Option<&Metadata>,
    pairs: &[String],
    from_file: Option<&Path>,
) -> Result<Metadata, CliError> {
    let mut metadata = match from_file {
        Some(path) => Metadata::from_value(entity_type, Some(read_json_file(path)?)),
        None => base.cloned().unwrap_or_else(|| Metadata::empty(entity_type)),
    };
    for (key, value) in parse_meta_pairs(pairs)? {
        metadata.set(entity_type, &key, &value);
    }
    Ok(metadata)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "yes".into(),
            reason: "confirmation required; pass --yes in non-interactive use".into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<serde_json::Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn meta_pairs_split_on_first_equals() {
        let pairs = parse_meta_pairs(&["ip_address=10.0.0.5".into(), "note=a=b".into()]).unwrap();
        assert_eq!(pairs[0], ("ip_address".into(), "10.0.0.5".into()));
        assert_eq!(pairs[1], ("note".into(), "a=b".into()));
    }

    #[test]
    fn meta_pairs_reject_missing_equals() {
        assert!(parse_meta_pairs(&["status".into()]).is_err());
        assert!(parse_meta_pairs(&["=online".into()]).is_err());
    }

    #[test]
    fn metadata_flags_apply_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"status": "offline", "ip_address": "10.0.0.5"}}"#).unwrap();

        let meta = build_metadata(
            EntityType::Device,
            None,
            &["status=online".into()],
            Some(file.path()),
        )
        .unwrap();
        assert_eq!(meta.get("status").as_deref(), Some("online"));
        assert_eq!(meta.get("ip_address").as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn entity_types_parse_case_insensitively() {
        assert_eq!(parse_entity_type("NBG").unwrap(), EntityType::Nbg);
        assert!(parse_entity_type("region").is_err());
    }
}
