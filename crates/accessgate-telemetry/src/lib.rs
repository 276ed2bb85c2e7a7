//! AccessGate Telemetry - Logging and request tracing.
//!
//! This crate provides:
//! - Subscriber setup with pretty, compact, JSON and full formats
//! - Stderr, stdout and rolling-file targets
//! - A per-request context span
//! - The audit event target shared by every pipeline stage
//!
//! # Example
//!
//! ```rust,no_run
//! use accessgate_telemetry::{AUDIT_TARGET, LogConfig, LogFormat, RequestContext, setup_logging};
//!
//! # fn main() -> Result<(), accessgate_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("accessgate_llm=debug");
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("req-1", "alice@example.com");
//! let _entered = ctx.span().entered();
//! tracing::info!(target: AUDIT_TARGET, "processing request");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{RequestContext, RequestGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    AUDIT_TARGET, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
