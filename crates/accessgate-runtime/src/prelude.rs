//! Prelude module - commonly used runtime types.
//!
//! Use `use accessgate_runtime::prelude::*;` to import all essential types.

pub use crate::{DecisionBuilder, Pipeline, RuntimeError, RuntimeResult};
