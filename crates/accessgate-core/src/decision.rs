//! Decisions and the payloads they carry.
//!
//! A [`Decision`] is the outcome for one intent; a [`MultiDecision`] is the
//! outcome for one inbound request. Both are tagged unions on the wire:
//!
//! ```json
//! {"request_id": "req-1", "session_id": "a@corp.com",
//!  "sub_decisions": [
//!    {"sub_request_index": 0, "status": "REQUIRES_APPROVAL", "service": "slack",
//!     "action": "join_channel", "reason": "...", "approver_group": "slack-admins",
//!     "payload": {"type": "chat_channel_join", "user": "a@corp.com", "channel": "#fde-updates"}}
//!  ],
//!  "summary": {"total": 1, "approved": 0, "denied": 0, "requires_approval": 1,
//!              "clarification_needed": 0}}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A service-specific action ready to hand to a provisioning system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionPayload {
    /// Add a user to a chat channel.
    ChatChannelJoin {
        /// User to add.
        user: String,
        /// Channel name, including any leading `#`.
        channel: String,
    },
    /// Grant a cloud IAM role on a resource.
    CloudIamGrant {
        /// Principal receiving the grant.
        user: String,
        /// Resource (bucket, account, project).
        resource: String,
        /// Provider role name.
        role: String,
        /// Access level the role was mapped from.
        access_level: String,
    },
    /// Grant a permission on a ticketing project.
    TicketingGrant {
        /// User receiving the permission.
        user: String,
        /// Project key or name.
        project: String,
        /// Permission name.
        permission: String,
    },
    /// Remove a user's access in a directory.
    DirectoryRevoke {
        /// User losing access.
        target_user: String,
        /// System the access is removed from.
        system: String,
        /// Who asked for the revocation.
        requested_by: String,
    },
    /// Record a hardware purchase.
    HardwarePurchase {
        /// User the item is for.
        requested_for: String,
        /// Item description.
        item: String,
        /// Estimated cost in dollars.
        estimated_cost: f64,
        /// Free-text justification.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        justification: Option<String>,
    },
}

/// Outcome for a single intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Go ahead.
    Approved {
        /// Target service.
        service: String,
        /// Action performed.
        action: String,
        /// What to execute.
        payload: ActionPayload,
    },
    /// Refused.
    Denied {
        /// Human-readable reason.
        reason: String,
    },
    /// Allowed once someone in `approver_group` signs off.
    RequiresApproval {
        /// Target service.
        service: String,
        /// Action requested.
        action: String,
        /// Why approval is needed.
        reason: String,
        /// Who approves.
        approver_group: String,
        /// What to execute after approval.
        payload: ActionPayload,
    },
    /// Not enough information to decide.
    ClarificationNeeded {
        /// Follow-up questions for the user.
        questions: Vec<String>,
    },
}

impl Decision {
    /// Shorthand for a denial.
    #[must_use]
    pub fn denied(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: reason.into(),
        }
    }

    /// Shorthand for a clarification with one question.
    #[must_use]
    pub fn clarify(question: impl Into<String>) -> Self {
        Self::ClarificationNeeded {
            questions: vec![question.into()],
        }
    }

    /// The status tag.
    #[must_use]
    pub fn status(&self) -> DecisionStatus {
        match self {
            Self::Approved { .. } => DecisionStatus::Approved,
            Self::Denied { .. } => DecisionStatus::Denied,
            Self::RequiresApproval { .. } => DecisionStatus::RequiresApproval,
            Self::ClarificationNeeded { .. } => DecisionStatus::ClarificationNeeded,
        }
    }

    /// The payload, for approved and approval-pending decisions.
    #[must_use]
    pub fn payload(&self) -> Option<&ActionPayload> {
        match self {
            Self::Approved { payload, .. } | Self::RequiresApproval { payload, .. } => {
                Some(payload)
            },
            Self::Denied { .. } | Self::ClarificationNeeded { .. } => None,
        }
    }

    /// One-line outcome used in session transcripts.
    #[must_use]
    pub fn outcome_line(&self) -> String {
        match self {
            Self::Approved {
                service, action, ..
            } => format!("APPROVED {action} on {service}"),
            Self::Denied { reason } => format!("DENIED: {reason}"),
            Self::RequiresApproval {
                service,
                action,
                approver_group,
                ..
            } => format!("REQUIRES_APPROVAL {action} on {service} by {approver_group}"),
            Self::ClarificationNeeded { questions } => {
                format!("CLARIFICATION_NEEDED: {}", questions.join(" "))
            },
        }
    }
}

/// Status tag of a [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionStatus {
    /// See [`Decision::Approved`].
    Approved,
    /// See [`Decision::Denied`].
    Denied,
    /// See [`Decision::RequiresApproval`].
    RequiresApproval,
    /// See [`Decision::ClarificationNeeded`].
    ClarificationNeeded,
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "APPROVED"),
            Self::Denied => write!(f, "DENIED"),
            Self::RequiresApproval => write!(f, "REQUIRES_APPROVAL"),
            Self::ClarificationNeeded => write!(f, "CLARIFICATION_NEEDED"),
        }
    }
}

/// A decision tagged with the index of the intent it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubDecision {
    /// Position of the intent within its request.
    pub sub_request_index: usize,
    /// The decision.
    #[serde(flatten)]
    pub decision: Decision,
}

/// Per-status counts for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of sub-decisions.
    pub total: usize,
    /// Approved count.
    pub approved: usize,
    /// Denied count.
    pub denied: usize,
    /// Approval-pending count.
    pub requires_approval: usize,
    /// Clarification count.
    pub clarification_needed: usize,
}

impl Summary {
    /// Count the statuses of `decisions`.
    #[must_use]
    pub fn tally<'a>(decisions: impl IntoIterator<Item = &'a Decision>) -> Self {
        decisions.into_iter().fold(Self::default(), |mut acc, d| {
            acc.total = acc.total.saturating_add(1);
            let bucket = match d.status() {
                DecisionStatus::Approved => &mut acc.approved,
                DecisionStatus::Denied => &mut acc.denied,
                DecisionStatus::RequiresApproval => &mut acc.requires_approval,
                DecisionStatus::ClarificationNeeded => &mut acc.clarification_needed,
            };
            *bucket = bucket.saturating_add(1);
            acc
        })
    }

    /// Add another summary's counts into this one.
    pub fn absorb(&mut self, other: &Self) {
        self.total = self.total.saturating_add(other.total);
        self.approved = self.approved.saturating_add(other.approved);
        self.denied = self.denied.saturating_add(other.denied);
        self.requires_approval = self.requires_approval.saturating_add(other.requires_approval);
        self.clarification_needed = self
            .clarification_needed
            .saturating_add(other.clarification_needed);
    }

    /// Whether the per-status counts add up to `total`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        [
            self.approved,
            self.denied,
            self.requires_approval,
            self.clarification_needed,
        ]
        .iter()
        .try_fold(0usize, |acc, n| acc.checked_add(*n))
            == Some(self.total)
    }
}

/// Outcome for one inbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiDecision {
    /// Request this answers.
    pub request_id: String,
    /// Session the request was processed in.
    pub session_id: String,
    /// One entry per extracted intent, in order.
    pub sub_decisions: Vec<SubDecision>,
    /// Status counts over `sub_decisions`.
    pub summary: Summary,
}

impl MultiDecision {
    /// Index `decisions` in order and compute the summary.
    #[must_use]
    pub fn from_decisions(
        request_id: impl Into<String>,
        session_id: impl Into<String>,
        decisions: Vec<Decision>,
    ) -> Self {
        let summary = Summary::tally(&decisions);
        let sub_decisions = decisions
            .into_iter()
            .enumerate()
            .map(|(sub_request_index, decision)| SubDecision {
                sub_request_index,
                decision,
            })
            .collect();
        Self {
            request_id: request_id.into(),
            session_id: session_id.into(),
            sub_decisions,
            summary,
        }
    }

    /// A response holding exactly one decision.
    #[must_use]
    pub fn single(
        request_id: impl Into<String>,
        session_id: impl Into<String>,
        decision: Decision,
    ) -> Self {
        Self::from_decisions(request_id, session_id, vec![decision])
    }

    /// Iterate over the bare decisions.
    pub fn decisions(&self) -> impl Iterator<Item = &Decision> {
        self.sub_decisions.iter().map(|s| &s.decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join() -> Decision {
        Decision::Approved {
            service: "slack".into(),
            action: "join_channel".into(),
            payload: ActionPayload::ChatChannelJoin {
                user: "a@corp.com".into(),
                channel: "#general".into(),
            },
        }
    }

    #[test]
    fn test_summary_counts_sum_to_total() {
        let multi = MultiDecision::from_decisions(
            "r1",
            "a@corp.com",
            vec![
                join(),
                Decision::denied("no"),
                Decision::clarify("which?"),
                Decision::denied("still no"),
            ],
        );
        assert_eq!(multi.summary.total, 4);
        assert_eq!(multi.summary.denied, 2);
        assert_eq!(multi.summary.approved, 1);
        assert_eq!(multi.summary.clarification_needed, 1);
        assert!(multi.summary.is_consistent());
        assert_eq!(multi.sub_decisions[3].sub_request_index, 3);
    }

    #[test]
    fn test_sub_decision_wire_shape() {
        let multi = MultiDecision::single("r1", "a@corp.com", join());
        let value = serde_json::to_value(&multi).unwrap();
        let sub = &value["sub_decisions"][0];
        assert_eq!(sub["sub_request_index"], 0);
        assert_eq!(sub["status"], "APPROVED");
        assert_eq!(sub["payload"]["type"], "chat_channel_join");
        assert_eq!(sub["payload"]["channel"], "#general");
        assert_eq!(value["summary"]["approved"], 1);
    }

    #[test]
    fn test_wire_shape_parses_back() {
        let json = r#"{
            "request_id": "r2", "session_id": "b@corp.com",
            "sub_decisions": [{"sub_request_index": 0, "status": "DENIED", "reason": "nope"}],
            "summary": {"total": 1, "approved": 0, "denied": 1, "requires_approval": 0, "clarification_needed": 0}
        }"#;
        let multi: MultiDecision = serde_json::from_str(json).unwrap();
        assert_eq!(multi.sub_decisions[0].decision, Decision::denied("nope"));
    }

    #[test]
    fn test_absorb_keeps_consistency() {
        let mut total = Summary::default();
        total.absorb(&Summary::tally(&[join(), Decision::denied("x")]));
        total.absorb(&Summary::tally(&[Decision::clarify("?")]));
        assert_eq!(total.total, 3);
        assert!(total.is_consistent());
    }

    #[test]
    fn test_outcome_line() {
        assert_eq!(Decision::denied("budget").outcome_line(), "DENIED: budget");
        assert_eq!(join().outcome_line(), "APPROVED join_channel on slack");
        assert!(join().payload().is_some());
        assert!(Decision::denied("x").payload().is_none());
    }
}
