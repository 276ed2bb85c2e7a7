//! Prelude module - commonly used guard types.
//!
//! Use `use accessgate_guard::prelude::*;` to import all essential types.

pub use crate::{
    AttemptOutcome, BlacklistConfig, BlacklistTracker, GuardError, GuardResult,
    InjectionDetector, PatternDetector,
};
