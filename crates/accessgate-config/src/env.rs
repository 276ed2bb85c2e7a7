//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they are applied on top of the
//! embedded defaults and below any settings file, so a value written in a
//! file always wins.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Mapping from environment variable name to settings field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// All supported `ACCESSGATE_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "ACCESSGATE_CONFIDENCE_THRESHOLD",
        field_path: "pipeline.confidence_threshold",
    },
    EnvMapping {
        var_name: "ACCESSGATE_REDACT_EXTRACTION_ERRORS",
        field_path: "pipeline.redact_extraction_errors",
    },
    EnvMapping {
        var_name: "ACCESSGATE_SPENDING_WINDOW_DAYS",
        field_path: "spending.window_days",
    },
    EnvMapping {
        var_name: "ACCESSGATE_SESSION_TTL_MINUTES",
        field_path: "session.idle_ttl_minutes",
    },
    EnvMapping {
        var_name: "ACCESSGATE_BLACKLIST_DURATION_HOURS",
        field_path: "blacklist.duration_hours",
    },
    EnvMapping {
        var_name: "ACCESSGATE_MODEL",
        field_path: "llm.model",
    },
    EnvMapping {
        var_name: "ACCESSGATE_LLM_BASE_URL",
        field_path: "llm.base_url",
    },
];

/// Snapshot the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Apply env var fallbacks onto a TOML tree.
///
/// Returns the number of fields set.
///
/// # Errors
///
/// Returns an error if a mapped field path does not point into a table.
pub fn apply_env_fallbacks(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<usize> {
    let mut applied: usize = 0;
    for mapping in ENV_MAPPINGS {
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };
        if raw.trim().is_empty() {
            continue;
        }
        set_path(merged, mapping.field_path, parse_scalar(raw)).map_err(|message| {
            ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message,
            }
        })?;
        debug!(var = mapping.var_name, field = mapping.field_path, "applied env fallback");
        applied = applied.saturating_add(1);
    }
    Ok(applied)
}

/// Interpret an env string as the most specific TOML scalar it parses as.
fn parse_scalar(raw: &str) -> toml::Value {
    let trimmed = raw.trim();
    if let Ok(b) = trimmed.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(trimmed.to_owned())
}

/// Set a dotted path inside a TOML tree, creating intermediate tables.
fn set_path(root: &mut toml::Value, path: &str, value: toml::Value) -> Result<(), String> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return Err("empty field path".to_owned());
    };

    let mut current = root;
    for segment in segments {
        let table = current
            .as_table_mut()
            .ok_or_else(|| format!("'{segment}' is not inside a table"))?;
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    let table = current
        .as_table_mut()
        .ok_or_else(|| format!("parent of '{leaf}' is not a table"))?;
    table.insert(leaf.to_owned(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar_types() {
        assert_eq!(parse_scalar("true"), toml::Value::Boolean(true));
        assert_eq!(parse_scalar("30"), toml::Value::Integer(30));
        assert_eq!(parse_scalar("0.8"), toml::Value::Float(0.8));
        assert_eq!(
            parse_scalar("claude-x"),
            toml::Value::String("claude-x".to_owned())
        );
    }

    #[test]
    fn test_apply_env_fallbacks_sets_nested_fields() {
        let mut merged: toml::Value = toml::from_str("[pipeline]\nconfidence_threshold = 0.7\n").unwrap();
        let env: HashMap<String, String> = [
            ("ACCESSGATE_CONFIDENCE_THRESHOLD".to_owned(), "0.9".to_owned()),
            ("ACCESSGATE_MODEL".to_owned(), "claude-test".to_owned()),
            ("UNRELATED".to_owned(), "x".to_owned()),
        ]
        .into_iter()
        .collect();

        let applied = apply_env_fallbacks(&mut merged, &env).unwrap();
        assert_eq!(applied, 2);
        assert_eq!(
            merged["pipeline"]["confidence_threshold"].as_float(),
            Some(0.9)
        );
        assert_eq!(merged["llm"]["model"].as_str(), Some("claude-test"));
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let env: HashMap<String, String> = [("ACCESSGATE_MODEL".to_owned(), "  ".to_owned())]
            .into_iter()
            .collect();
        assert_eq!(apply_env_fallbacks(&mut merged, &env).unwrap(), 0);
    }
}
