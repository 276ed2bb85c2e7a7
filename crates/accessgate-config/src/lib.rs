#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Settings and access policy for AccessGate.
//!
//! Two documents configure a run:
//!
//! - **Settings** (TOML): thresholds, windows, model and approval routing.
//!   Loaded from embedded defaults, `ACCESSGATE_*` environment fallbacks and
//!   an optional file, in that order of increasing priority.
//! - **Policy** (JSON): per-service rules and per-department roles.
//!
//! ```rust,no_run
//! use accessgate_config::{load_policy, load_settings};
//!
//! let settings = load_settings(None).unwrap();
//! let policy = load_policy(std::path::Path::new("policy.json")).unwrap();
//! println!("{} services, threshold {}", policy.services.len(), settings.pipeline.confidence_threshold);
//! ```
//!
//! # Design
//!
//! This crate has **no dependencies on other internal accessgate crates**.
//! Conversion into domain types (for example the expiry boundary) happens
//! where the pipeline is assembled.

pub mod prelude;

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Settings and policy file loading.
pub mod loader;
/// Access policy document types.
pub mod policy;
/// Settings struct definitions.
pub mod settings;
/// Settings and policy validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_policy, load_settings, load_settings_with_env};
pub use policy::{
    ChannelPolicy, PolicyConfig, RolePolicy, SensitiveRule, SensitiveRuleKind, ServiceKind,
    ServicePolicy, WILDCARD,
};
pub use settings::{
    ApprovalSection, BlacklistSection, BoundarySetting, ExpirySection, LlmSection,
    PipelineSection, SessionSection, Settings, SpendingSection,
};
