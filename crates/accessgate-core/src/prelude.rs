//! Prelude module - commonly used types for convenient import.
//!
//! Use `use accessgate_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Time
pub use crate::{Clock, ExpiryBoundary, ManualClock, SystemClock};

// Requests and identity
pub use crate::{AccessRequest, Identity, InboundRequest};

// Intents
pub use crate::{ActionType, Intent, RawIntent};

// Decisions
pub use crate::{ActionPayload, Decision, DecisionStatus, MultiDecision, SubDecision, Summary};
