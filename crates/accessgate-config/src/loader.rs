//! Settings and policy loading.
//!
//! Settings are layered:
//! 1. Parse embedded `defaults.toml` → base
//! 2. Apply `ACCESSGATE_*` env var fallbacks
//! 3. Merge the settings file, if one was given
//! 4. Deserialize merged tree → [`Settings`]
//! 5. Validate
//!
//! The policy is a single JSON document with no layering.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::policy::PolicyConfig;
use crate::settings::Settings;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config or policy file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load settings from defaults, the process environment and an optional file.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, or if the
/// merged settings fail validation.
pub fn load_settings(path: Option<&Path>) -> ConfigResult<Settings> {
    load_settings_with_env(path, &collect_env_vars())
}

/// Like [`load_settings`] with an explicit environment snapshot.
///
/// # Errors
///
/// Same as [`load_settings`].
pub fn load_settings_with_env(
    path: Option<&Path>,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<Settings> {
    // 1. Parse embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    // 2. Env var fallbacks.
    let env_count = apply_env_fallbacks(&mut merged, env_vars)?;
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    // 3. Settings file.
    if let Some(path) = path {
        let overlay = load_toml_file(path)?;
        deep_merge(&mut merged, &overlay);
        info!(path = %path.display(), "loaded settings file");
    }

    // 4. Deserialize.
    let settings: Settings =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged settings>".to_owned(),
                source: e,
            })?;

    // 5. Validate.
    validate::validate_settings(&settings)?;
    Ok(settings)
}

/// Load and validate the JSON access policy.
///
/// Validation warnings are logged; only structural problems are errors.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is unreadable, not valid policy
/// JSON, or fails validation.
pub fn load_policy(path: &Path) -> ConfigResult<PolicyConfig> {
    let content = read_bounded(path)?;
    let policy =
        PolicyConfig::from_json_str(&content).map_err(|e| ConfigError::PolicyParseError {
            path: path.display().to_string(),
            source: e,
        })?;

    for warning in validate::validate_policy(&policy)? {
        tracing::warn!(path = %path.display(), "{warning}");
    }

    info!(
        path = %path.display(),
        services = policy.services.len(),
        roles = policy.roles.len(),
        "loaded access policy"
    );
    Ok(policy)
}

/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

fn load_toml_file(path: &Path) -> ConfigResult<toml::Value> {
    let content = read_bounded(path)?;
    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Read a file, refusing anything over [`MAX_CONFIG_FILE_SIZE`].
///
/// Size is checked after reading to avoid a TOCTOU gap between stat and read.
fn read_bounded(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_load_without_file() {
        let settings = load_settings_with_env(None, &HashMap::new()).unwrap();
        assert!((settings.pipeline.confidence_threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(settings.spending.window_days, 90);
        assert_eq!(settings.session.idle_ttl_minutes, 30);
        assert_eq!(settings.blacklist.duration_hours, 24);
        assert!(settings.blacklist.warning_ttl_hours.is_none());
        assert_eq!(settings.approval.default_approver_group, "it-admins");
    }

    #[test]
    fn test_file_overrides_env_fallback() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[spending]\nwindow_days = 30\n[expiry]\nboundary = \"exclusive\"").unwrap();

        let env: HashMap<String, String> = [
            ("ACCESSGATE_SPENDING_WINDOW_DAYS".to_owned(), "7".to_owned()),
            ("ACCESSGATE_SESSION_TTL_MINUTES".to_owned(), "5".to_owned()),
        ]
        .into_iter()
        .collect();

        let settings = load_settings_with_env(Some(file.path()), &env).unwrap();
        assert_eq!(settings.spending.window_days, 30);
        assert_eq!(settings.session.idle_ttl_minutes, 5);
        assert_eq!(
            settings.expiry.boundary,
            crate::settings::BoundarySetting::Exclusive
        );
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nconfidence_threshold = 1.5").unwrap();
        let err = load_settings_with_env(Some(file.path()), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_missing_settings_file_is_an_error() {
        let err = load_settings_with_env(
            Some(Path::new("/nonexistent/accessgate.toml")),
            &HashMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_load_policy_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"services": {{"Slack": {{}}}}, "roles": {{"IT": {{"allowed_systems": ["*"]}}}}}}"#
        )
        .unwrap();
        let policy = load_policy(file.path()).unwrap();
        assert!(policy.is_known_service("slack"));
        assert!(policy.role("it").is_some());
    }

    #[test]
    fn test_malformed_policy_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = load_policy(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::PolicyParseError { .. }));
    }

    #[test]
    fn test_deep_merge_replaces_scalars_and_keeps_siblings() {
        let mut base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\nx = 10").unwrap();
        deep_merge(&mut base, &overlay);
        assert_eq!(base["a"]["x"].as_integer(), Some(10));
        assert_eq!(base["a"]["y"].as_integer(), Some(2));
    }
}
