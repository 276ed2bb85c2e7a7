//! Mock intent extractors.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use accessgate_core::{Intent, RawIntent};
use accessgate_llm::{IntentExtractor, LlmError, LlmResult};
use async_trait::async_trait;
use serde_json::Value;

/// What an extractor was called with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionCall {
    /// Request text.
    pub text: String,
    /// Session transcript passed in.
    pub history: Option<String>,
    /// Pending clarifications passed in.
    pub pending: Option<Vec<Intent>>,
}

/// Extractor scripted by request text.
///
/// Unscripted text extracts nothing.
#[derive(Debug, Default)]
pub struct MockExtractor {
    responses: HashMap<String, Vec<RawIntent>>,
    calls: Mutex<Vec<ExtractionCall>>,
}

impl MockExtractor {
    /// Create an extractor with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the intents returned for `text`. `intents` is a JSON array of
    /// raw intents.
    #[must_use]
    pub fn with_response(mut self, text: &str, intents: Value) -> Self {
        let parsed: Vec<RawIntent> =
            serde_json::from_value(intents).expect("scripted intents must be a raw intent array");
        self.responses.insert(text.trim().to_owned(), parsed);
        self
    }

    /// Every call so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<ExtractionCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// The most recent call.
    #[must_use]
    pub fn last_call(&self) -> Option<ExtractionCall> {
        self.calls().pop()
    }
}

#[async_trait]
impl IntentExtractor for MockExtractor {
    async fn extract(
        &self,
        text: &str,
        history: Option<&str>,
        pending: Option<&[Intent]>,
    ) -> LlmResult<Vec<RawIntent>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ExtractionCall {
                text: text.to_owned(),
                history: history.map(str::to_owned),
                pending: pending.map(<[Intent]>::to_vec),
            });
        }
        Ok(self.responses.get(text.trim()).cloned().unwrap_or_default())
    }
}

/// Extractor that always fails.
#[derive(Debug)]
pub struct FailingExtractor {
    message: String,
    calls: AtomicUsize,
}

impl FailingExtractor {
    /// Fail every call with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentExtractor for FailingExtractor {
    async fn extract(
        &self,
        _text: &str,
        _history: Option<&str>,
        _pending: Option<&[Intent]>,
    ) -> LlmResult<Vec<RawIntent>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::ApiRequestFailed(self.message.clone()))
    }
}
