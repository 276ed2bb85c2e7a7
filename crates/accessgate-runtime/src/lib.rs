//! AccessGate Runtime - The decision pipeline.
//!
//! This crate wires the other crates together:
//! - [`Pipeline`]: gating, extraction, normalization, evaluation and session
//!   bookkeeping for each request
//! - [`DecisionBuilder`]: verdict plus intent to a [`Decision`](accessgate_core::Decision)
//! - [`config_bridge`]: settings to domain types
//!
//! # Example
//!
//! ```rust,no_run
//! use accessgate_config::{load_policy, load_settings};
//! use accessgate_core::SystemClock;
//! use accessgate_llm::{ClaudeProvider, LlmIntentExtractor};
//! use accessgate_runtime::{Pipeline, config_bridge};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = load_settings(None)?;
//! let policy = load_policy(std::path::Path::new("policy.json"))?;
//! let provider = ClaudeProvider::new(config_bridge::to_provider_config("api-key", &settings));
//! let extractor = Arc::new(LlmIntentExtractor::new(provider, &policy));
//! let pipeline = Pipeline::new(&settings, policy, extractor, Arc::new(SystemClock))?;
//!
//! let decisions = pipeline.process_batch(Vec::new()).await;
//! assert!(decisions.is_empty());
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

pub mod builder;
pub mod config_bridge;
mod error;
pub mod pipeline;

pub use builder::{DecisionBuilder, HARDWARE_SERVICE, clarifying_questions};
pub use error::{RuntimeError, RuntimeResult};
pub use pipeline::Pipeline;
