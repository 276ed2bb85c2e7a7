//! AccessGate Core - Foundation types for the AccessGate decision pipeline.
//!
//! This crate provides:
//! - Caller identity and inbound request types
//! - Structured intents as produced by the extraction step
//! - Decisions, payloads and per-request summaries
//! - The [`Clock`] abstraction used by every time-windowed store
//! - Core error types

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod clock;
pub mod decision;
pub mod error;
pub mod identity;
pub mod intent;

pub use clock::{Clock, ExpiryBoundary, ManualClock, SystemClock};
pub use decision::{ActionPayload, Decision, DecisionStatus, MultiDecision, SubDecision, Summary};
pub use error::{CoreError, CoreResult};
pub use identity::{AccessRequest, Identity, InboundRequest};
pub use intent::{ActionType, Intent, RawIntent, clamp_confidence};
