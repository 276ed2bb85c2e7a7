//! Per-request tracing context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context carried through the processing of one inbound request.
///
/// Every event logged while the request's span is entered is tagged with the
/// request id, the user and the batch correlation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Caller-supplied request id.
    pub request_id: String,
    /// Requesting user.
    pub user: String,
    /// Shared by every request of one batch run.
    pub correlation_id: Uuid,
    /// When processing started.
    pub started_at: DateTime<Utc>,
}

impl RequestContext {
    /// Create a context with a fresh correlation id.
    #[must_use]
    pub fn new(request_id: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            user: user.into(),
            correlation_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    /// Attach to an existing batch correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = id;
        self
    }

    /// Milliseconds since the request started.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }

    /// Span tagging events with this request.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "request",
            request_id = %self.request_id,
            user = %self.user,
            correlation_id = %self.correlation_id,
        )
    }
}

/// Enters a request span and logs the elapsed time when dropped.
///
/// Only for synchronous sections; async code should use
/// `tracing::Instrument` with [`RequestContext::span`].
pub struct RequestGuard {
    context: RequestContext,
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl RequestGuard {
    /// Enter the context's span.
    #[must_use]
    pub fn new(context: RequestContext) -> Self {
        let span = context.span().entered();
        tracing::debug!("request started");
        Self { context, span }
    }

    /// The guarded context.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        tracing::debug!(elapsed_ms = self.context.elapsed_ms(), "request completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_fields() {
        let batch = Uuid::new_v4();
        let ctx = RequestContext::new("req-1", "alice@example.com").with_correlation_id(batch);
        assert_eq!(ctx.request_id, "req-1");
        assert_eq!(ctx.user, "alice@example.com");
        assert_eq!(ctx.correlation_id, batch);
        assert!(ctx.elapsed_ms() >= 0);
    }

    #[test]
    fn test_guard_exposes_context() {
        let guard = RequestGuard::new(RequestContext::new("req-2", "bob@example.com"));
        assert_eq!(guard.context().request_id, "req-2");
    }
}
