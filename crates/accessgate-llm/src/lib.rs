//! AccessGate LLM - Intent extraction over a language model.
//!
//! This crate provides:
//! - [`LlmProvider`]: a minimal completion trait
//! - [`ClaudeProvider`]: the Anthropic Messages API implementation
//! - [`IntentExtractor`]: the seam the pipeline calls, and
//!   [`LlmIntentExtractor`], which prompts a provider with the configured
//!   services and parses its JSON reply

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod claude;
mod error;
mod extractor;
mod provider;
mod types;

pub use claude::ClaudeProvider;
pub use error::{LlmError, LlmResult};
pub use extractor::{IntentExtractor, LlmIntentExtractor, build_system_prompt, parse_intents};
pub use provider::{LlmProvider, ProviderConfig};
pub use types::{Message, MessageRole};
