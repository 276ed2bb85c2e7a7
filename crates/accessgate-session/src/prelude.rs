//! Prelude module - commonly used session types.
//!
//! Use `use accessgate_session::prelude::*;` to import all essential types.

pub use crate::{Session, SessionStore, Turn};
