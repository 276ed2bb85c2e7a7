//! Turning untrusted extraction output into [`Intent`]s.
//!
//! The extraction model is never trusted to be consistent with the policy.
//! Anything it reports that the policy does not recognize lowers the
//! intent's confidence, which sends it to clarification instead of
//! evaluation.

use accessgate_config::PolicyConfig;
use accessgate_core::{ActionType, Intent, RawIntent};
use tracing::debug;

/// Confidence ceiling for an unrecognized action type.
pub const UNKNOWN_TYPE_CEILING: f64 = 0.3;
/// Confidence ceiling for a missing or undeclared target system.
pub const UNKNOWN_SYSTEM_CEILING: f64 = 0.5;
/// Confidence ceiling for an action the target service does not support.
pub const INVALID_ACTION_CEILING: f64 = 0.4;

/// Normalize one raw intent against `policy`.
#[must_use]
pub fn normalize(raw: &RawIntent, policy: &PolicyConfig) -> Intent {
    let label = raw.action_type.as_deref().and_then(non_blank);
    let parsed = label.and_then(ActionType::from_label);
    let action_type = parsed.unwrap_or(ActionType::Unknown);

    let mut intent = Intent::new(action_type, raw.confidence_value());
    intent.target_system = raw
        .target_system
        .as_deref()
        .and_then(non_blank)
        .map(str::to_lowercase);
    intent.target_resource = owned_non_blank(raw.target_resource.as_deref());
    intent.requested_action = owned_non_blank(raw.requested_action.as_deref());
    intent.target_user = owned_non_blank(raw.target_user.as_deref());
    intent.justification = owned_non_blank(raw.justification.as_deref());

    if action_type == ActionType::Unknown {
        debug!(label = ?label, "unrecognized action type");
        intent.cap_confidence(UNKNOWN_TYPE_CEILING);
    }

    let service = intent
        .target_system
        .as_deref()
        .and_then(|system| policy.service(system));

    if matches!(
        action_type,
        ActionType::AccessRequest | ActionType::RevokeAccess
    ) && service.is_none()
    {
        debug!(system = ?intent.target_system, "target system missing or not in policy");
        intent.cap_confidence(UNKNOWN_SYSTEM_CEILING);
    }

    if let (Some(service), Some(action)) = (service, intent.requested_action.as_deref())
        && !service.is_valid_action(action)
    {
        debug!(action, system = ?intent.target_system, "action not valid for service");
        intent.cap_confidence(INVALID_ACTION_CEILING);
    }

    intent
}

/// Normalize every raw intent, preserving order.
#[must_use]
pub fn normalize_all(raw: &[RawIntent], policy: &PolicyConfig) -> Vec<Intent> {
    raw.iter().map(|r| normalize(r, policy)).collect()
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn owned_non_blank(s: Option<&str>) -> Option<String> {
    s.and_then(non_blank).map(str::to_owned)
}
