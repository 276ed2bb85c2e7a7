//! Structured intents.
//!
//! A [`RawIntent`] is whatever the extraction step produced: every field is
//! optional and nothing is trusted. Normalization (in `accessgate-approval`)
//! turns it into an [`Intent`], whose confidence is always inside `[0, 1]`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// The kind of thing being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Access to a system or resource.
    AccessRequest,
    /// A hardware purchase.
    HardwareRequest,
    /// Removal of someone's access.
    RevokeAccess,
    /// Could not be classified.
    Unknown,
}

impl ActionType {
    /// Parse a label as emitted by the extraction step.
    ///
    /// Case-insensitive; accepts the canonical names plus short aliases.
    /// Returns `None` for anything unrecognized.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "ACCESS_REQUEST" | "ACCESS" | "GRANT_ACCESS" => Some(Self::AccessRequest),
            "HARDWARE_REQUEST" | "HARDWARE" | "PURCHASE" => Some(Self::HardwareRequest),
            "REVOKE_ACCESS" | "REVOKE" | "REMOVE_ACCESS" => Some(Self::RevokeAccess),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Canonical wire label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccessRequest => "ACCESS_REQUEST",
            Self::HardwareRequest => "HARDWARE_REQUEST",
            Self::RevokeAccess => "REVOKE_ACCESS",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for ActionType {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::from_label(s).ok_or_else(|| CoreError::UnknownActionType(s.trim().to_string()))
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a confidence score into `[0, 1]`. Non-finite values become 0.
#[must_use]
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A normalized intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// What is being asked for.
    pub action_type: ActionType,
    /// Target system, lower-cased (e.g. `slack`, `aws`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_system: Option<String>,
    /// Resource within the system (channel, bucket, project, hardware item).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_resource: Option<String>,
    /// Action within the system (e.g. `join_channel`, `read`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_action: Option<String>,
    /// Someone other than the requester (revocations).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user: Option<String>,
    /// Free-text justification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,
}

impl Intent {
    /// Create an intent with only an action type and confidence.
    #[must_use]
    pub fn new(action_type: ActionType, confidence: f64) -> Self {
        Self {
            action_type,
            target_system: None,
            target_resource: None,
            requested_action: None,
            target_user: None,
            justification: None,
            confidence: clamp_confidence(confidence),
        }
    }

    /// Set the target system (lower-cased).
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.target_system = Some(system.into().to_lowercase());
        self
    }

    /// Set the target resource.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.target_resource = Some(resource.into());
        self
    }

    /// Set the requested action.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.requested_action = Some(action.into());
        self
    }

    /// Set the target user.
    #[must_use]
    pub fn with_target_user(mut self, user: impl Into<String>) -> Self {
        self.target_user = Some(user.into());
        self
    }

    /// Set the justification.
    #[must_use]
    pub fn with_justification(mut self, justification: impl Into<String>) -> Self {
        self.justification = Some(justification.into());
        self
    }

    /// Lower the confidence to at most `ceiling`. Never raises it.
    pub fn cap_confidence(&mut self, ceiling: f64) {
        self.confidence = clamp_confidence(self.confidence.min(ceiling));
    }

    /// Short human-readable summary, used in transcripts and logs.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![self.action_type.to_string()];
        if let Some(system) = &self.target_system {
            parts.push(system.clone());
        }
        if let Some(resource) = &self.target_resource {
            parts.push(resource.clone());
        }
        if let Some(action) = &self.requested_action {
            parts.push(action.clone());
        }
        if let Some(user) = &self.target_user {
            parts.push(format!("for {user}"));
        }
        parts.join(" ")
    }
}

/// An intent exactly as emitted by the extraction step.
///
/// Every field is optional and every value is untrusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIntent {
    /// Action type label; anything unrecognized degrades to `UNKNOWN`.
    #[serde(default)]
    pub action_type: Option<String>,
    /// Target system name.
    #[serde(default)]
    pub target_system: Option<String>,
    /// Target resource.
    #[serde(default)]
    pub target_resource: Option<String>,
    /// Requested action.
    #[serde(default)]
    pub requested_action: Option<String>,
    /// Target user.
    #[serde(default)]
    pub target_user: Option<String>,
    /// Justification.
    #[serde(default)]
    pub justification: Option<String>,
    /// Confidence, as a number or numeric string.
    #[serde(default)]
    pub confidence: Option<Value>,
}

impl RawIntent {
    /// Confidence as a float, before clamping. Missing or unparseable
    /// values read as 0.
    #[must_use]
    pub fn confidence_value(&self) -> f64 {
        match &self.confidence {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_aliases() {
        assert_eq!(
            ActionType::from_label("access_request"),
            Some(ActionType::AccessRequest)
        );
        assert_eq!(
            ActionType::from_label("Hardware"),
            Some(ActionType::HardwareRequest)
        );
        assert_eq!(
            ActionType::from_label("revoke-access"),
            Some(ActionType::RevokeAccess)
        );
        assert_eq!(ActionType::from_label("DELETE_EVERYTHING"), None);
        assert!(matches!(
            "DELETE_EVERYTHING".parse::<ActionType>(),
            Err(CoreError::UnknownActionType(label)) if label == "DELETE_EVERYTHING"
        ));
    }

    #[test]
    fn test_action_type_serde() {
        let json = serde_json::to_string(&ActionType::RevokeAccess).unwrap();
        assert_eq!(json, "\"REVOKE_ACCESS\"");
    }

    #[test]
    fn test_clamp_confidence() {
        assert!((clamp_confidence(1.7) - 1.0).abs() < f64::EPSILON);
        assert!(clamp_confidence(-0.2).abs() < f64::EPSILON);
        assert!(clamp_confidence(f64::NAN).abs() < f64::EPSILON);
        assert!((clamp_confidence(f64::INFINITY) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cap_confidence_never_raises() {
        let mut intent = Intent::new(ActionType::AccessRequest, 0.2);
        intent.cap_confidence(0.5);
        assert!((intent.confidence - 0.2).abs() < f64::EPSILON);

        let mut intent = Intent::new(ActionType::AccessRequest, 0.9);
        intent.cap_confidence(0.5);
        assert!((intent.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_raw_intent_confidence_forms() {
        let raw: RawIntent = serde_json::from_str(r#"{"confidence": "0.85"}"#).unwrap();
        assert!((raw.confidence_value() - 0.85).abs() < 1e-9);

        let raw: RawIntent = serde_json::from_str(r#"{"confidence": 0.4}"#).unwrap();
        assert!((raw.confidence_value() - 0.4).abs() < 1e-9);

        let raw: RawIntent = serde_json::from_str(r#"{"confidence": null}"#).unwrap();
        assert!(raw.confidence_value().abs() < f64::EPSILON);
    }

    #[test]
    fn test_intent_summary() {
        let intent = Intent::new(ActionType::AccessRequest, 0.9)
            .with_system("Slack")
            .with_resource("#general")
            .with_action("join_channel");
        assert_eq!(intent.summary(), "ACCESS_REQUEST slack #general join_channel");
    }
}
