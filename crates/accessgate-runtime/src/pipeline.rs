//! The request pipeline.
//!
//! ```text
//! request ─▶ blacklist gate ─▶ injection gate ─▶ extraction (with session context)
//!         ─▶ normalization ─▶ per intent: evaluate ─▶ build decision ─▶ spend
//!         ─▶ session turn ─▶ MultiDecision
//! ```
//!
//! Requests are processed one at a time and intents left to right. The
//! extraction call is the only await point.

use std::sync::Arc;

use accessgate_approval::{SpendingStatus, SpendingTracker, evaluate, normalize_all};
use accessgate_config::{PolicyConfig, Settings};
use accessgate_core::{
    AccessRequest, ActionPayload, Clock, Decision, InboundRequest, Intent, MultiDecision,
};
use accessgate_guard::{AttemptOutcome, BlacklistTracker, InjectionDetector, PatternDetector};
use accessgate_llm::IntentExtractor;
use accessgate_session::SessionStore;
use accessgate_telemetry::{AUDIT_TARGET, RequestContext};
use tracing::{Instrument, debug, error, info, warn};
use uuid::Uuid;

use crate::builder::DecisionBuilder;
use crate::config_bridge::{
    session_ttl, spending_window, to_blacklist_config, to_expiry_boundary,
};
use crate::error::RuntimeResult;

/// Reply when no intent could be extracted.
pub const NOTHING_EXTRACTED_QUESTION: &str =
    "I couldn't tell what you're asking for. Which system or resource do you need access to, \
     or which hardware item do you need?";

/// Reply to extraction failures when error detail is redacted.
pub const REDACTED_EXTRACTION_ERROR: &str =
    "Your request could not be processed right now. Please try again later.";

/// Reply to a blacklisted user.
pub const BLACKLISTED_REASON: &str =
    "Access denied: your requests are temporarily blocked after repeated attempts to manipulate \
     the approval system.";

/// The assembled decision pipeline.
///
/// Stores are shared behind [`Arc`] so callers can inspect or administer
/// them; the pipeline is their only writer during processing.
pub struct Pipeline {
    detector: Box<dyn InjectionDetector>,
    blacklist: Arc<BlacklistTracker>,
    spending: Arc<SpendingTracker>,
    sessions: Arc<SessionStore>,
    extractor: Arc<dyn IntentExtractor>,
    policy: Arc<PolicyConfig>,
    builder: DecisionBuilder,
    redact_extraction_errors: bool,
}

impl Pipeline {
    /// Assemble a pipeline with fresh stores and the built-in pattern
    /// detector.
    ///
    /// # Errors
    ///
    /// Returns an error if the injection signatures fail to compile or the
    /// spending window is not positive.
    pub fn new(
        settings: &Settings,
        policy: PolicyConfig,
        extractor: Arc<dyn IntentExtractor>,
        clock: Arc<dyn Clock>,
    ) -> RuntimeResult<Self> {
        let boundary = to_expiry_boundary(settings.expiry.boundary);
        Ok(Self {
            detector: Box::new(PatternDetector::new()?),
            blacklist: Arc::new(BlacklistTracker::new(
                Arc::clone(&clock),
                to_blacklist_config(settings),
            )),
            spending: Arc::new(SpendingTracker::new(
                Arc::clone(&clock),
                spending_window(settings),
                boundary,
            )?),
            sessions: Arc::new(SessionStore::new(clock, session_ttl(settings), boundary)),
            extractor,
            policy: Arc::new(policy),
            builder: DecisionBuilder::from_settings(settings),
            redact_extraction_errors: settings.pipeline.redact_extraction_errors,
        })
    }

    /// Replace the injection detector.
    #[must_use]
    pub fn with_detector(mut self, detector: Box<dyn InjectionDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// The blacklist tracker.
    #[must_use]
    pub fn blacklist(&self) -> &Arc<BlacklistTracker> {
        &self.blacklist
    }

    /// The spending ledger.
    #[must_use]
    pub fn spending(&self) -> &Arc<SpendingTracker> {
        &self.spending
    }

    /// The session store.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// The loaded policy.
    #[must_use]
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Process one request.
    pub async fn process(&self, request: AccessRequest) -> MultiDecision {
        let context = RequestContext::new(&request.id, &request.identity.email);
        self.process_in_context(request, context).await
    }

    /// Process a batch in order. One output per input; invalid entries are
    /// denied without touching any store.
    pub async fn process_batch(&self, requests: Vec<InboundRequest>) -> Vec<MultiDecision> {
        let correlation_id = Uuid::new_v4();
        info!(%correlation_id, count = requests.len(), "processing batch");

        let mut decisions = Vec::with_capacity(requests.len());
        for inbound in requests {
            let id = inbound.id.clone();
            let user = inbound.user_email.clone();
            let decision = match AccessRequest::try_from(inbound) {
                Ok(request) => {
                    let context = RequestContext::new(&request.id, &request.identity.email)
                        .with_correlation_id(correlation_id);
                    self.process_in_context(request, context).await
                },
                Err(e) => {
                    warn!(target: AUDIT_TARGET, request_id = %id, user = %user, error = %e, "invalid request");
                    MultiDecision::single(id, user, Decision::denied(format!("Invalid request: {e}")))
                },
            };
            decisions.push(decision);
        }
        decisions
    }

    async fn process_in_context(
        &self,
        request: AccessRequest,
        context: RequestContext,
    ) -> MultiDecision {
        let span = context.span();
        let decision = self.run(request).instrument(span.clone()).await;
        span.in_scope(|| {
            info!(
                target: AUDIT_TARGET,
                total = decision.summary.total,
                approved = decision.summary.approved,
                denied = decision.summary.denied,
                requires_approval = decision.summary.requires_approval,
                clarification_needed = decision.summary.clarification_needed,
                elapsed_ms = context.elapsed_ms(),
                "request decided"
            );
        });
        decision
    }

    async fn run(&self, request: AccessRequest) -> MultiDecision {
        let user = request.identity.email.clone();

        if self.blacklist.is_blacklisted(&user) {
            warn!(target: AUDIT_TARGET, gate = "blacklist", "request from blacklisted user denied");
            return MultiDecision::single(&request.id, &user, Decision::denied(BLACKLISTED_REASON));
        }

        let signatures = self.detector.matches(&request.raw_text);
        if !signatures.is_empty() {
            let outcome = self.blacklist.record_attempt(&user, &request.raw_text);
            warn!(
                target: AUDIT_TARGET,
                gate = "injection",
                ?signatures,
                ?outcome,
                "prompt injection detected"
            );
            return MultiDecision::single(
                &request.id,
                &user,
                Decision::denied(self.injection_reason(outcome)),
            );
        }

        let history = self.sessions.conversation_history(&user);
        let pending = self.sessions.pending_clarifications(&user);
        let raw = match self
            .extractor
            .extract(&request.raw_text, history.as_deref(), pending.as_deref())
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                error!(target: AUDIT_TARGET, error = %e, "intent extraction failed");
                let reason = if self.redact_extraction_errors {
                    REDACTED_EXTRACTION_ERROR.to_owned()
                } else {
                    format!("Could not process request: {e}")
                };
                return MultiDecision::single(&request.id, &user, Decision::denied(reason));
            },
        };

        let intents = normalize_all(&raw, &self.policy);
        let decision = if intents.is_empty() {
            debug!("no intents extracted");
            MultiDecision::single(&request.id, &user, Decision::clarify(NOTHING_EXTRACTED_QUESTION))
        } else {
            let decisions = self.decide_all(&request, &intents);
            MultiDecision::from_decisions(&request.id, &user, decisions)
        };

        self.sessions
            .add_turn(&user, request, intents, decision.clone());
        decision
    }

    fn decide_all(&self, request: &AccessRequest, intents: &[Intent]) -> Vec<Decision> {
        let user = &request.identity.email;
        let mut running_total = self.spending.get_spending(user);

        intents
            .iter()
            .enumerate()
            .map(|(index, intent)| {
                let result = evaluate(intent, &request.identity, running_total, &self.policy);
                let decision =
                    self.builder
                        .execute(request, intent, &result, result.estimated_cost, &self.policy);

                info!(
                    target: AUDIT_TARGET,
                    index,
                    intent = %intent.summary(),
                    confidence = intent.confidence,
                    verdict = %result,
                    rules = ?result.rules_evaluated,
                    status = %decision.status(),
                    "intent decided"
                );

                if let Some(ActionPayload::HardwarePurchase { estimated_cost, .. }) =
                    decision.payload()
                {
                    running_total += estimated_cost;
                    let status = if matches!(decision, Decision::RequiresApproval { .. }) {
                        SpendingStatus::RequiresApproval
                    } else {
                        SpendingStatus::Approved
                    };
                    self.spending.record(&request.id, user, *estimated_cost, status);
                }
                decision
            })
            .collect()
    }

    fn injection_reason(&self, outcome: AttemptOutcome) -> String {
        match outcome {
            AttemptOutcome::Warned => "Request rejected: it contains instructions that attempt to \
                 manipulate the approval system. This is a warning; another attempt will block \
                 your requests."
                .to_owned(),
            AttemptOutcome::Blacklisted | AttemptOutcome::AlreadyBlacklisted => format!(
                "Request rejected: repeated attempts to manipulate the approval system. Your \
                 requests are blocked for {} hours.",
                self.blacklist.config().duration.num_hours()
            ),
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("builder", &self.builder)
            .field("redact_extraction_errors", &self.redact_extraction_errors)
            .finish_non_exhaustive()
    }
}
