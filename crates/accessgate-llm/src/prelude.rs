//! Prelude module - commonly used LLM types.
//!
//! Use `use accessgate_llm::prelude::*;` to import all essential types.

pub use crate::{
    ClaudeProvider, IntentExtractor, LlmError, LlmIntentExtractor, LlmProvider, LlmResult,
    Message, ProviderConfig,
};
