//! Commonly used configuration types.
//!
//! ```rust
//! use accessgate_config::prelude::*;
//! ```

pub use crate::{
    BoundarySetting, ConfigError, ConfigResult, PolicyConfig, RolePolicy, SensitiveRuleKind,
    ServiceKind, ServicePolicy, Settings, load_policy, load_settings,
};
