//! Post-load validation.
//!
//! Settings problems are hard errors. Policy problems split in two: values
//! that would make evaluation meaningless (a negative or non-finite budget cap)
//! are errors, while likely typos (an allow-list naming a service the policy
//! does not declare) come back as warnings for the caller to log.

use crate::error::{ConfigError, ConfigResult};
use crate::policy::{PolicyConfig, WILDCARD};
use crate::settings::Settings;

/// Maximum allowed `llm.max_tokens`.
const MAX_TOKENS_UPPER_BOUND: usize = 200_000;

/// Validate merged settings.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate_settings(settings: &Settings) -> ConfigResult<()> {
    validate_pipeline(settings)?;
    validate_windows(settings)?;
    validate_llm(settings)?;
    validate_approval(settings)?;
    Ok(())
}

fn validate_pipeline(settings: &Settings) -> ConfigResult<()> {
    let threshold = settings.pipeline.confidence_threshold;
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(ConfigError::ValidationError {
            field: "pipeline.confidence_threshold".to_owned(),
            message: format!("threshold {threshold} is out of range; must be between 0.0 and 1.0"),
        });
    }
    Ok(())
}

fn validate_windows(settings: &Settings) -> ConfigResult<()> {
    let positive = [
        ("spending.window_days", settings.spending.window_days),
        ("session.idle_ttl_minutes", settings.session.idle_ttl_minutes),
        ("blacklist.duration_hours", settings.blacklist.duration_hours),
    ];
    for (field, value) in positive {
        if value == 0 {
            return Err(ConfigError::ValidationError {
                field: field.to_owned(),
                message: "must be greater than zero".to_owned(),
            });
        }
    }

    if settings.blacklist.warning_ttl_hours == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "blacklist.warning_ttl_hours".to_owned(),
            message: "must be greater than zero when set; omit it to keep warnings indefinitely"
                .to_owned(),
        });
    }
    Ok(())
}

fn validate_llm(settings: &Settings) -> ConfigResult<()> {
    let llm = &settings.llm;

    if llm.model.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "llm.model".to_owned(),
            message: "model name must not be empty".to_owned(),
        });
    }

    if llm.max_tokens == 0 || llm.max_tokens > MAX_TOKENS_UPPER_BOUND {
        return Err(ConfigError::ValidationError {
            field: "llm.max_tokens".to_owned(),
            message: format!("max_tokens must be between 1 and {MAX_TOKENS_UPPER_BOUND}"),
        });
    }

    if !(0.0..=1.0).contains(&llm.temperature) {
        return Err(ConfigError::ValidationError {
            field: "llm.temperature".to_owned(),
            message: format!(
                "temperature {} is out of range; must be between 0.0 and 1.0",
                llm.temperature
            ),
        });
    }

    if let Some(url) = &llm.base_url
        && !(url.starts_with("https://") || url.starts_with("http://"))
    {
        return Err(ConfigError::ValidationError {
            field: "llm.base_url".to_owned(),
            message: format!("'{url}' is not an http(s) URL"),
        });
    }
    Ok(())
}

fn validate_approval(settings: &Settings) -> ConfigResult<()> {
    if settings.approval.default_approver_group.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "approval.default_approver_group".to_owned(),
            message: "default approver group must not be empty".to_owned(),
        });
    }
    Ok(())
}

/// Validate a normalized policy.
///
/// Returns human-readable warnings for suspicious but usable entries.
///
/// # Errors
///
/// Returns an error for a budget cap that is negative or not finite.
pub fn validate_policy(policy: &PolicyConfig) -> ConfigResult<Vec<String>> {
    let mut warnings = Vec::new();

    for (department, role) in &policy.roles {
        if let Some(cap) = role.max_hardware_budget
            && (!cap.is_finite() || cap < 0.0)
        {
            return Err(ConfigError::ValidationError {
                field: format!("roles.{department}.max_hardware_budget"),
                message: format!("budget {cap} must be a finite, non-negative amount"),
            });
        }

        for system in &role.allowed_systems {
            if system != WILDCARD && !policy.is_known_service(system) {
                warnings.push(format!(
                    "role '{department}' allows system '{system}' which has no service entry"
                ));
            }
        }
    }

    for (name, service) in &policy.services {
        if service.kind_for(name).is_none() {
            warnings.push(format!(
                "service '{name}' has no declared kind and none can be inferred; \
                 access requests for it cannot produce a payload"
            ));
        }
        for resource in service.resource_restrictions.keys() {
            if !service.has_resource(resource) {
                warnings.push(format!(
                    "service '{name}' restricts resource '{resource}' which is not in its catalog"
                ));
            }
        }
    }

    Ok(warnings)
}
