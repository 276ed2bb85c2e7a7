//! AccessGate Test - Shared test utilities.
//!
//! Fixtures (a sample policy, identities, requests) and mock extractors
//! for use as a dev-dependency.
//!
//! ```rust,ignore
//! use accessgate_test::{MockExtractor, engineering, sample_policy};
//! use serde_json::json;
//!
//! let extractor = MockExtractor::new().with_response(
//!     "add me to #general",
//!     json!([{"action_type": "ACCESS_REQUEST", "target_system": "slack",
//!             "target_resource": "#general", "confidence": 0.95}]),
//! );
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
