//! In-memory session store with idle expiry.

use accessgate_core::{AccessRequest, Clock, Decision, ExpiryBoundary, Intent, MultiDecision};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use tracing::{debug, warn};

/// One request/response exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// The request as received.
    pub request: AccessRequest,
    /// Intents extracted from it, in sub-decision order.
    pub intents: Vec<Intent>,
    /// The response.
    pub decision: MultiDecision,
    /// When the turn was recorded.
    pub at: DateTime<Utc>,
}

/// A user's conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session key. The user's email.
    pub id: String,
    /// Turns in the order they happened.
    pub turns: Vec<Turn>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the last turn was added.
    pub last_activity: DateTime<Utc>,
}

impl Session {
    fn new(id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_owned(),
            turns: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Render the conversation for the extraction prompt.
    ///
    /// ```text
    /// User: I need access to #fde-updates
    /// System: [0] REQUIRES_APPROVAL join_channel on slack by slack-admins
    /// ```
    #[must_use]
    pub fn transcript(&self) -> String {
        let mut lines = Vec::new();
        for turn in &self.turns {
            lines.push(format!("User: {}", turn.request.raw_text));
            for sub in &turn.decision.sub_decisions {
                lines.push(format!(
                    "System: [{}] {}",
                    sub.sub_request_index,
                    sub.decision.outcome_line()
                ));
            }
        }
        lines.join("\n")
    }

    /// Intents from the last turn that ended in a clarification.
    #[must_use]
    pub fn pending_clarifications(&self) -> Vec<Intent> {
        let Some(last) = self.turns.last() else {
            return Vec::new();
        };
        last.decision
            .sub_decisions
            .iter()
            .filter(|sub| matches!(sub.decision, Decision::ClarificationNeeded { .. }))
            .filter_map(|sub| last.intents.get(sub.sub_request_index).cloned())
            .collect()
    }
}

/// Per-user sessions, evicted after an idle timeout.
///
/// Every public method first drops sessions idle longer than the timeout.
/// There is no background sweep.
///
/// The session key is the user's email, so concurrent conversations by the
/// same user share one context.
pub struct SessionStore {
    clock: Arc<dyn Clock>,
    idle_ttl: Duration,
    boundary: ExpiryBoundary,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, idle_ttl: Duration, boundary: ExpiryBoundary) -> Self {
        Self {
            clock,
            idle_ttl,
            boundary,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Lock the map and evict idle sessions.
    fn live(&self) -> (RwLockWriteGuard<'_, HashMap<String, Session>>, DateTime<Utc>) {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| {
            warn!("SessionStore lock poisoned, recovering");
            e.into_inner()
        });
        sessions.retain(|id, session| {
            let live = self
                .boundary
                .is_live(session.last_activity, now, self.idle_ttl);
            if !live {
                debug!(session_id = %id, "session expired");
            }
            live
        });
        (sessions, now)
    }

    /// The session for `id`, created if absent.
    pub fn get_or_create(&self, id: &str) -> Session {
        let (mut sessions, now) = self.live();
        sessions
            .entry(id.to_owned())
            .or_insert_with(|| {
                debug!(session_id = id, "session created");
                Session::new(id, now)
            })
            .clone()
    }

    /// The session for `id`, if live.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        let (sessions, _) = self.live();
        sessions.get(id).cloned()
    }

    /// Append a turn, creating the session if needed.
    ///
    /// Turn timestamps strictly increase within a session. A turn recorded at
    /// or before the previous one, because of a tie or a clock step back, is
    /// placed one nanosecond after it.
    pub fn add_turn(
        &self,
        id: &str,
        request: AccessRequest,
        intents: Vec<Intent>,
        decision: MultiDecision,
    ) {
        let (mut sessions, now) = self.live();
        let session = sessions
            .entry(id.to_owned())
            .or_insert_with(|| Session::new(id, now));
        let at = match session.turns.last() {
            Some(prev) if now <= prev.at => prev
                .at
                .checked_add_signed(Duration::nanoseconds(1))
                .unwrap_or(prev.at),
            _ => now.max(session.last_activity),
        };
        session.turns.push(Turn {
            request,
            intents,
            decision,
            at,
        });
        session.last_activity = at;
        debug!(session_id = id, turns = session.turns.len(), "turn recorded");
    }

    /// The transcript for `id`, or `None` if there is no live session or it
    /// has no turns.
    #[must_use]
    pub fn conversation_history(&self, id: &str) -> Option<String> {
        let (sessions, _) = self.live();
        sessions
            .get(id)
            .filter(|s| !s.turns.is_empty())
            .map(Session::transcript)
    }

    /// Intents still awaiting clarification from the last turn, if any.
    #[must_use]
    pub fn pending_clarifications(&self, id: &str) -> Option<Vec<Intent>> {
        let (sessions, _) = self.live();
        sessions
            .get(id)
            .map(Session::pending_clarifications)
            .filter(|pending| !pending.is_empty())
    }

    /// Drop `id`'s session. Returns whether one existed.
    pub fn end_session(&self, id: &str) -> bool {
        let (mut sessions, _) = self.live();
        sessions.remove(id).is_some()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn count(&self) -> usize {
        let (sessions, _) = self.live();
        sessions.len()
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("idle_ttl", &self.idle_ttl)
            .field("boundary", &self.boundary)
            .finish_non_exhaustive()
    }
}
