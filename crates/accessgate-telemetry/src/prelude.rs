//! Commonly used telemetry types.
//!
//! ```rust
//! use accessgate_telemetry::prelude::*;
//! ```

pub use crate::{
    AUDIT_TARGET, LogConfig, LogFormat, LogTarget, RequestContext, RequestGuard, TelemetryError,
    TelemetryResult, setup_logging,
};
