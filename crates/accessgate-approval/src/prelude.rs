//! Prelude module - commonly used approval types.
//!
//! Use `use accessgate_approval::prelude::*;` to import all essential types.

pub use crate::{
    ApprovalError, ApprovalResult, PolicyResult, SpendingStatus, SpendingTracker, Verdict,
    estimate_hardware_cost, evaluate, normalize, normalize_all,
};
