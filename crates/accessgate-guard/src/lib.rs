//! AccessGate Guard - Gates that run before any intent is extracted.
//!
//! This crate provides:
//! - [`InjectionDetector`], a pluggable strategy for spotting manipulation
//!   attempts, with the regex-based [`PatternDetector`] as the default
//! - [`BlacklistTracker`], the per-user warn-then-block escalation state
//!
//! Both gates run on raw request text. Nothing that fails them reaches the
//! extraction model or the policy evaluator.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod blacklist;
pub mod error;
pub mod injection;

pub use blacklist::{AttemptOutcome, BlacklistConfig, BlacklistEntry, BlacklistTracker, Warning};
pub use error::{GuardError, GuardResult};
pub use injection::{InjectionDetector, PatternDetector};
