//! Turning a policy verdict into a [`Decision`].
//!
//! Order of precedence for one intent:
//!
//! 1. confidence below the threshold: clarification, whatever the policy said
//! 2. policy denial: the policy's reason, verbatim
//! 3. payload construction; anything missing: clarification
//! 4. approval required: routed to the approver group, otherwise approved

use accessgate_approval::{PolicyResult, Verdict, estimate_hardware_cost};
use accessgate_config::{PolicyConfig, ServiceKind, ServicePolicy, Settings};
use accessgate_core::{AccessRequest, ActionPayload, ActionType, Decision, Intent, MultiDecision};

/// Service name used on hardware decisions.
pub const HARDWARE_SERVICE: &str = "hardware";

/// A payload plus the labels it is reported under.
struct Built {
    service: String,
    action: String,
    payload: ActionPayload,
}

/// Builds per-intent decisions.
#[derive(Debug, Clone)]
pub struct DecisionBuilder {
    confidence_threshold: f64,
    default_approver_group: String,
}

impl DecisionBuilder {
    /// Create a builder.
    pub fn new(confidence_threshold: f64, default_approver_group: impl Into<String>) -> Self {
        Self {
            confidence_threshold,
            default_approver_group: default_approver_group.into(),
        }
    }

    /// Create a builder from the `[pipeline]` and `[approval]` sections.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.pipeline.confidence_threshold,
            settings.approval.default_approver_group.clone(),
        )
    }

    /// Minimum confidence for an intent to be decided.
    #[must_use]
    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    /// Decide one intent.
    ///
    /// `estimated_cost` overrides the price table for hardware payloads; when
    /// `None` the policy result's estimate is used, then the table.
    #[must_use]
    pub fn execute(
        &self,
        request: &AccessRequest,
        intent: &Intent,
        result: &PolicyResult,
        estimated_cost: Option<f64>,
        policy: &PolicyConfig,
    ) -> Decision {
        if intent.confidence < self.confidence_threshold {
            return Decision::ClarificationNeeded {
                questions: clarifying_questions(intent, policy),
            };
        }

        let approval = match &result.verdict {
            Verdict::Denied { reason } => return Decision::denied(reason.clone()),
            Verdict::RequiresApproval {
                reason,
                approver_group,
            } => Some((reason, approver_group)),
            Verdict::Allowed => None,
        };

        let cost = estimated_cost.or(result.estimated_cost);
        let built = match build_payload(request, intent, cost, policy) {
            Ok(built) => built,
            Err(questions) => return Decision::ClarificationNeeded { questions },
        };

        match approval {
            Some((reason, approver_group)) => Decision::RequiresApproval {
                service: built.service,
                action: built.action,
                reason: reason.clone(),
                approver_group: approver_group
                    .clone()
                    .unwrap_or_else(|| self.default_approver_group.clone()),
                payload: built.payload,
            },
            None => Decision::Approved {
                service: built.service,
                action: built.action,
                payload: built.payload,
            },
        }
    }

    /// Decide every intent of one request, in order.
    ///
    /// `intents` and `results` are paired by position.
    #[must_use]
    pub fn execute_multiple(
        &self,
        request: &AccessRequest,
        intents: &[Intent],
        results: &[PolicyResult],
        policy: &PolicyConfig,
    ) -> MultiDecision {
        let decisions = intents
            .iter()
            .zip(results)
            .map(|(intent, result)| self.execute(request, intent, result, None, policy))
            .collect();
        MultiDecision::from_decisions(&request.id, &request.identity.email, decisions)
    }
}

fn build_payload(
    request: &AccessRequest,
    intent: &Intent,
    estimated_cost: Option<f64>,
    policy: &PolicyConfig,
) -> Result<Built, Vec<String>> {
    let requester = &request.identity.email;
    match intent.action_type {
        ActionType::HardwareRequest => {
            let item = intent
                .target_resource
                .clone()
                .ok_or_else(|| vec![missing_item_question()])?;
            Ok(Built {
                service: HARDWARE_SERVICE.to_owned(),
                action: "purchase".to_owned(),
                payload: ActionPayload::HardwarePurchase {
                    requested_for: requester.clone(),
                    item,
                    estimated_cost: estimated_cost.unwrap_or_else(|| estimate_hardware_cost(intent)),
                    justification: intent.justification.clone(),
                },
            })
        },
        ActionType::RevokeAccess => {
            let system = intent
                .target_system
                .clone()
                .ok_or_else(|| vec![missing_revoke_system_question()])?;
            let target_user = intent
                .target_user
                .clone()
                .ok_or_else(|| vec![missing_target_user_question()])?;
            Ok(Built {
                action: intent
                    .requested_action
                    .clone()
                    .unwrap_or_else(|| "revoke_access".to_owned()),
                payload: ActionPayload::DirectoryRevoke {
                    target_user,
                    system: system.clone(),
                    requested_by: requester.clone(),
                },
                service: system,
            })
        },
        ActionType::AccessRequest => build_access_payload(requester, intent, policy),
        ActionType::Unknown => Err(vec![unknown_type_question()]),
    }
}

fn build_access_payload(
    requester: &str,
    intent: &Intent,
    policy: &PolicyConfig,
) -> Result<Built, Vec<String>> {
    let system = intent
        .target_system
        .as_deref()
        .ok_or_else(|| vec![missing_system_question(policy)])?;
    let service = policy.service(system);
    let kind = service
        .and_then(|s| s.kind_for(system))
        .or_else(|| ServiceKind::infer(system));
    let resource = intent.target_resource.clone();

    match kind {
        Some(ServiceKind::Chat) => {
            let channel = resource.ok_or_else(|| vec![missing_resource_question(system, kind)])?;
            let channel = service
                .and_then(|s| s.catalog_name(&channel))
                .map(str::to_owned)
                .unwrap_or(channel);
            Ok(Built {
                service: system.to_owned(),
                action: intent
                    .requested_action
                    .clone()
                    .unwrap_or_else(|| "join_channel".to_owned()),
                payload: ActionPayload::ChatChannelJoin {
                    user: requester.to_owned(),
                    channel,
                },
            })
        },
        Some(ServiceKind::CloudIam) => {
            let resource = resource.ok_or_else(|| vec![missing_resource_question(system, kind)])?;
            let level = intent
                .requested_action
                .clone()
                .ok_or_else(|| vec![access_level_question(system, service)])?;
            let role = match service {
                Some(s) if !s.access_levels.is_empty() => s
                    .role_for_level(&level)
                    .map(str::to_owned)
                    .ok_or_else(|| vec![access_level_question(system, service)])?,
                _ => level.clone(),
            };
            Ok(Built {
                service: system.to_owned(),
                action: level.clone(),
                payload: ActionPayload::CloudIamGrant {
                    user: requester.to_owned(),
                    resource,
                    role,
                    access_level: level,
                },
            })
        },
        Some(ServiceKind::Ticketing) => {
            let project = resource.ok_or_else(|| vec![missing_resource_question(system, kind)])?;
            let permission = intent
                .requested_action
                .clone()
                .unwrap_or_else(|| "browse".to_owned());
            Ok(Built {
                service: system.to_owned(),
                action: permission.clone(),
                payload: ActionPayload::TicketingGrant {
                    user: requester.to_owned(),
                    project,
                    permission,
                },
            })
        },
        Some(ServiceKind::Directory) => Err(vec![format!(
            "Access to {system} is managed by IT and can't be granted here. \
             Which application do you need access to?"
        )]),
        None => Err(vec![format!(
            "I don't know how to provision access to '{system}'. Which system did you mean?"
        )]),
    }
}

/// Targeted follow-up questions for an under-specified intent.
#[must_use]
pub fn clarifying_questions(intent: &Intent, policy: &PolicyConfig) -> Vec<String> {
    let mut questions = Vec::new();
    match intent.action_type {
        ActionType::Unknown => questions.push(unknown_type_question()),
        ActionType::HardwareRequest => {
            if intent.target_resource.is_none() {
                questions.push(missing_item_question());
            }
        },
        ActionType::RevokeAccess => {
            if intent.target_user.is_none() {
                questions.push(missing_target_user_question());
            }
            if intent.target_system.is_none() {
                questions.push(missing_revoke_system_question());
            }
        },
        ActionType::AccessRequest => match intent.target_system.as_deref() {
            None => questions.push(missing_system_question(policy)),
            Some(system) => match policy.service(system) {
                None => questions.push(format!(
                    "I don't recognize '{system}'. {}",
                    known_systems_hint(policy)
                )),
                Some(service) => {
                    if let Some(action) = intent.requested_action.as_deref()
                        && !service.is_valid_action(action)
                    {
                        questions.push(format!(
                            "'{action}' is not a supported action on {system}. Supported actions: {}.",
                            service.valid_actions.join(", ")
                        ));
                    }
                    if intent.target_resource.is_none() {
                        questions.push(missing_resource_question(system, service.kind_for(system)));
                    }
                },
            },
        },
    }

    if questions.is_empty() {
        questions.push(format!(
            "Just to confirm, you are asking for: {}. Is that right?",
            intent.summary()
        ));
    }
    questions
}

fn unknown_type_question() -> String {
    "Are you asking for access to a system, for new hardware, or to revoke someone's access?"
        .to_owned()
}

fn missing_item_question() -> String {
    "Which hardware item do you need?".to_owned()
}

fn missing_target_user_question() -> String {
    "Whose access should be revoked?".to_owned()
}

fn missing_revoke_system_question() -> String {
    "Which system should their access be removed from?".to_owned()
}

fn missing_system_question(policy: &PolicyConfig) -> String {
    format!("Which system do you need access to? {}", known_systems_hint(policy))
}

fn known_systems_hint(policy: &PolicyConfig) -> String {
    let names: Vec<&str> = policy.services.keys().map(String::as_str).collect();
    if names.is_empty() {
        String::new()
    } else {
        format!("Known systems: {}.", names.join(", "))
    }
}

fn missing_resource_question(system: &str, kind: Option<ServiceKind>) -> String {
    match kind {
        Some(ServiceKind::Chat) => format!("Which {system} channel do you want to join?"),
        Some(ServiceKind::Ticketing) => format!("Which {system} project do you need access to?"),
        _ => format!("Which resource in {system} do you need access to?"),
    }
}

fn access_level_question(system: &str, service: Option<&ServicePolicy>) -> String {
    match service {
        Some(s) if !s.access_levels.is_empty() => {
            let levels: Vec<&str> = s.access_levels.keys().map(String::as_str).collect();
            format!(
                "What level of access do you need on {system}? Options: {}.",
                levels.join(", ")
            )
        },
        _ => format!("What level of access do you need on {system}?"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accessgate_approval::evaluate;
    use accessgate_core::{DecisionStatus, Identity};
    use accessgate_test::{engineering, intern, sample_policy};

    fn builder() -> DecisionBuilder {
        DecisionBuilder::new(0.7, "it-admins")
    }

    fn decide(identity: Identity, intent: &Intent) -> Decision {
        let policy = sample_policy();
        let request = AccessRequest::new("req-1", identity, "text");
        let result = evaluate(intent, &request.identity, 0.0, &policy);
        builder().execute(&request, intent, &result, None, &policy)
    }

    #[test]
    fn test_low_confidence_clarifies_even_if_denied() {
        let intent = Intent::new(ActionType::AccessRequest, 0.69)
            .with_system("slack")
            .with_resource("#does-not-exist");
        let decision = decide(engineering(), &intent);
        assert_eq!(decision.status(), DecisionStatus::ClarificationNeeded);
    }

    #[test]
    fn test_denial_reason_is_verbatim() {
        let policy = sample_policy();
        let intent = Intent::new(ActionType::AccessRequest, 0.95)
            .with_system("slack")
            .with_resource("#nope");
        let request = AccessRequest::new("req-1", engineering(), "text");
        let result = evaluate(&intent, &request.identity, 0.0, &policy);
        let decision = builder().execute(&request, &intent, &result, None, &policy);
        assert_eq!(
            decision,
            Decision::Denied {
                reason: result.reason().unwrap().to_owned()
            }
        );
    }

    #[test]
    fn test_channel_approval_routes_to_slack_admins() {
        let intent = Intent::new(ActionType::AccessRequest, 0.95)
            .with_system("slack")
            .with_resource("#fde-updates")
            .with_action("join_channel");
        match decide(engineering(), &intent) {
            Decision::RequiresApproval {
                approver_group,
                payload,
                ..
            } => {
                assert_eq!(approver_group, "slack-admins");
                assert_eq!(
                    payload,
                    ActionPayload::ChatChannelJoin {
                        user: engineering().email,
                        channel: "#fde-updates".into()
                    }
                );
            },
            other => panic!("expected approval routing, got {other:?}"),
        }
    }

    #[test]
    fn test_cloud_grant_maps_access_level_to_role() {
        let intent = Intent::new(ActionType::AccessRequest, 0.9)
            .with_system("aws")
            .with_resource("prod-logs")
            .with_action("read");
        let decision = decide(engineering(), &intent);
        let Some(ActionPayload::CloudIamGrant { role, access_level, .. }) = decision.payload() else {
            panic!("expected a cloud grant, got {decision:?}");
        };
        assert_eq!(role, "ReadOnlyAccess");
        assert_eq!(access_level, "read");
    }

    #[test]
    fn test_channel_without_hash_uses_catalog_spelling() {
        let intent = Intent::new(ActionType::AccessRequest, 0.95)
            .with_system("slack")
            .with_resource("general");
        let decision = decide(engineering(), &intent);
        assert_eq!(decision.status(), DecisionStatus::Approved);
        assert_eq!(
            decision.payload(),
            Some(&ActionPayload::ChatChannelJoin {
                user: engineering().email,
                channel: "#general".into()
            })
        );
    }

    #[test]
    fn test_ticketing_grant_defaults_to_browse() {
        let intent = Intent::new(ActionType::AccessRequest, 0.9)
            .with_system("jira")
            .with_resource("PLAT");
        let decision = decide(engineering(), &intent);
        assert_eq!(decision.status(), DecisionStatus::Approved);
        assert_eq!(
            decision.payload(),
            Some(&ActionPayload::TicketingGrant {
                user: engineering().email,
                project: "PLAT".into(),
                permission: "browse".into()
            })
        );

        let edit = Intent::new(ActionType::AccessRequest, 0.9)
            .with_system("jira")
            .with_resource("OPS")
            .with_action("edit");
        assert_eq!(decide(engineering(), &edit).status(), DecisionStatus::Denied);
    }

    #[test]
    fn test_missing_channel_becomes_clarification() {
        let intent = Intent::new(ActionType::AccessRequest, 0.9)
            .with_system("slack")
            .with_action("join_channel");
        let Decision::ClarificationNeeded { questions } = decide(engineering(), &intent) else {
            panic!("expected clarification");
        };
        assert_eq!(questions, vec!["Which slack channel do you want to join?".to_owned()]);
    }

    #[test]
    fn test_hardware_payload_uses_estimate() {
        let intent = Intent::new(ActionType::HardwareRequest, 0.9)
            .with_resource("MacBook Air")
            .with_justification("new hire");
        let decision = decide(intern(), &intent);
        assert_eq!(decision.status(), DecisionStatus::Approved);
        assert_eq!(
            decision.payload(),
            Some(&ActionPayload::HardwarePurchase {
                requested_for: intern().email,
                item: "MacBook Air".into(),
                estimated_cost: 1200.0,
                justification: Some("new hire".into()),
            })
        );
    }

    #[test]
    fn test_questions_are_targeted() {
        let policy = sample_policy();

        let unknown = Intent::new(ActionType::Unknown, 0.2);
        assert!(clarifying_questions(&unknown, &policy)[0].contains("hardware"));

        let no_system = Intent::new(ActionType::AccessRequest, 0.5);
        assert!(clarifying_questions(&no_system, &policy)[0].starts_with("Which system"));

        let revoke = Intent::new(ActionType::RevokeAccess, 0.5);
        assert_eq!(clarifying_questions(&revoke, &policy).len(), 2);

        let hardware = Intent::new(ActionType::HardwareRequest, 0.5);
        assert_eq!(
            clarifying_questions(&hardware, &policy),
            vec!["Which hardware item do you need?".to_owned()]
        );

        let complete = Intent::new(ActionType::HardwareRequest, 0.5).with_resource("keyboard");
        assert!(clarifying_questions(&complete, &policy)[0].starts_with("Just to confirm"));
    }

    #[test]
    fn test_execute_multiple_tags_and_tallies() {
        let policy = sample_policy();
        let request = AccessRequest::new("req-9", engineering(), "text");
        let intents = vec![
            Intent::new(ActionType::AccessRequest, 0.95)
                .with_system("slack")
                .with_resource("#general")
                .with_action("join_channel"),
            Intent::new(ActionType::HardwareRequest, 0.3),
        ];
        let results: Vec<_> = intents
            .iter()
            .map(|i| evaluate(i, &request.identity, 0.0, &policy))
            .collect();
        let multi = builder().execute_multiple(&request, &intents, &results, &policy);
        assert_eq!(multi.sub_decisions[1].sub_request_index, 1);
        assert_eq!(multi.summary.approved, 1);
        assert_eq!(multi.summary.clarification_needed, 1);
        assert!(multi.summary.is_consistent());
    }
}
