//! AccessGate Approval - Deciding what an intent is allowed to do.
//!
//! This crate provides:
//! - **Normalization**: untrusted extraction output to [`Intent`](accessgate_core::Intent),
//!   lowering confidence for anything the policy does not recognize
//! - **Pricing**: the keyword price table for hardware requests
//! - **Spending**: the append-only, rolling-window [`SpendingTracker`]
//! - **Policy**: [`evaluate`], a pure function from intent, identity,
//!   running budget and policy to a [`PolicyResult`] with its rule trace
//!
//! # Example
//!
//! ```
//! use accessgate_approval::{evaluate, Verdict};
//! use accessgate_config::PolicyConfig;
//! use accessgate_core::{ActionType, Identity, Intent};
//!
//! let policy = PolicyConfig::from_json_str(
//!     r#"{"roles": {"Finance": {"allowed_systems": ["slack"]}}}"#,
//! ).unwrap();
//! let intent = Intent::new(ActionType::AccessRequest, 0.9).with_system("aws");
//! let result = evaluate(&intent, &Identity::new("cfo@corp.com", "Finance"), 0.0, &policy);
//! assert!(matches!(result.verdict, Verdict::Denied { .. }));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

/// Error types and results for the approval layer.
pub mod error;
pub mod normalize;
pub mod policy;
pub mod pricing;
pub mod spending;

pub use error::{ApprovalError, ApprovalResult};
pub use normalize::{normalize, normalize_all};
pub use policy::{PolicyResult, Verdict, evaluate};
pub use pricing::{DEFAULT_HARDWARE_COST, estimate_hardware_cost, estimate_item_cost};
pub use spending::{SpendingRecord, SpendingStatus, SpendingTracker};
