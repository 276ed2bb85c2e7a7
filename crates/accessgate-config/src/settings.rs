//! Runtime settings.
//!
//! Every section implements [`Default`] with the same values as the embedded
//! `defaults.toml`, so a bare `[section]` header produces a working
//! configuration.

use serde::{Deserialize, Serialize};

/// Root settings for an AccessGate run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Decision pipeline behaviour.
    pub pipeline: PipelineSection,
    /// Spending ledger window.
    pub spending: SpendingSection,
    /// Conversation session lifetime.
    pub session: SessionSection,
    /// Blacklist escalation timings.
    pub blacklist: BlacklistSection,
    /// Shared expiry boundary rule.
    pub expiry: ExpirySection,
    /// Intent extraction model.
    pub llm: LlmSection,
    /// Approval routing.
    pub approval: ApprovalSection,
}

/// Decision pipeline behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Intents below this confidence always need clarification.
    pub confidence_threshold: f64,
    /// Replace extraction error text with a generic message in decisions.
    pub redact_extraction_errors: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            redact_extraction_errors: false,
        }
    }
}

/// Spending ledger window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpendingSection {
    /// Rolling window, in days, over which hardware spend is summed.
    pub window_days: u32,
}

impl Default for SpendingSection {
    fn default() -> Self {
        Self { window_days: 90 }
    }
}

/// Conversation session lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Sessions idle longer than this are evicted on the next access.
    pub idle_ttl_minutes: u32,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            idle_ttl_minutes: 30,
        }
    }
}

/// Blacklist escalation timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlacklistSection {
    /// How long a blacklist entry lasts.
    pub duration_hours: u32,
    /// Optional lifetime for first-offense warnings. Unset means warnings
    /// persist until cleared.
    pub warning_ttl_hours: Option<u32>,
}

impl Default for BlacklistSection {
    fn default() -> Self {
        Self {
            duration_hours: 24,
            warning_ttl_hours: None,
        }
    }
}

/// Whether an age exactly equal to a limit counts as expired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundarySetting {
    /// `age == limit` is still live.
    #[default]
    Inclusive,
    /// `age == limit` has expired.
    Exclusive,
}

/// Shared expiry boundary rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirySection {
    /// Applied to blacklist duration, spending window and session TTL.
    pub boundary: BoundarySetting,
}

/// Intent extraction model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// Model name sent to the provider API.
    pub model: String,
    /// Maximum tokens to request per extraction.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f64,
    /// Override for the provider endpoint.
    pub base_url: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_owned(),
            max_tokens: 1024,
            temperature: 0.0,
            base_url: None,
        }
    }
}

/// Approval routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalSection {
    /// Used when neither a sensitive-action rule nor the service names an
    /// approver group.
    pub default_approver_group: String,
}

impl Default for ApprovalSection {
    fn default() -> Self {
        Self {
            default_approver_group: "it-admins".to_owned(),
        }
    }
}
