//! Policy evaluation: allow, deny, or require approval.
//!
//! # Check Order
//!
//! 1. Is the action type UNKNOWN? -> `Denied`
//! 2. Does the department have a role? -> `Denied` if not
//! 3. REVOKE_ACCESS: does the role grant `can_revoke`? -> `Denied` if not
//! 4. HARDWARE_REQUEST: does `running_total + cost` fit the cap? -> `Denied` if not
//! 5. ACCESS_REQUEST:
//!    a. Is the system allow-listed? -> `Denied` if not
//!    b. Does the resource exist in the catalog? -> `Denied` if not
//!    c. Is the action sensitive? -> `Denied`, or remember approval
//!    d. Is the resource restricted to groups the user lacks? -> `Denied`
//!    e. Channel sub-policy: restricted -> `Denied`, auto-approved -> clear
//!       approval, otherwise -> require approval
//!
//! Evaluation stops at the first denial, so nothing later can override it.
//! Each check consulted is appended to [`PolicyResult::rules_evaluated`].

use accessgate_config::{PolicyConfig, RolePolicy, SensitiveRuleKind, ServicePolicy};
use accessgate_core::{ActionType, Identity, Intent};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pricing::estimate_hardware_cost;

/// Rule names recorded in the evaluation trace.
pub mod rules {
    /// Action type recognized.
    pub const ACTION_TYPE: &str = "action_type";
    /// Department has a role entry.
    pub const DEPARTMENT_POLICY: &str = "department_policy";
    /// Revocation capability.
    pub const REVOKE_PERMISSION: &str = "revoke_permission";
    /// Rolling-window hardware cap.
    pub const HARDWARE_BUDGET: &str = "hardware_budget";
    /// System allow-list.
    pub const SYSTEM_ACCESS: &str = "system_access";
    /// Resource catalog.
    pub const RESOURCE_EXISTS: &str = "resource_exists";
    /// Sensitive-action table.
    pub const SENSITIVE_ACTION: &str = "sensitive_action";
    /// Resource-level group restriction.
    pub const RESOURCE_GROUP_RESTRICTION: &str = "resource_group_restriction";
    /// Chat-channel sub-policy.
    pub const CHANNEL_POLICY: &str = "channel_policy";
}

/// The outcome of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Proceed.
    Allowed,
    /// Proceed once approved.
    RequiresApproval {
        /// Why approval is needed.
        reason: String,
        /// Approver named by the policy, if any.
        approver_group: Option<String>,
    },
    /// Refused.
    Denied {
        /// Human-readable reason.
        reason: String,
    },
}

/// A verdict plus the audit trace that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyResult {
    /// The outcome.
    #[serde(flatten)]
    pub verdict: Verdict,
    /// Checks consulted, in order.
    pub rules_evaluated: Vec<String>,
    /// Estimated cost for hardware intents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
}

impl PolicyResult {
    /// Whether the intent may proceed (possibly after approval).
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        !matches!(self.verdict, Verdict::Denied { .. })
    }

    /// Whether approval is required.
    #[must_use]
    pub fn requires_approval(&self) -> bool {
        matches!(self.verdict, Verdict::RequiresApproval { .. })
    }

    /// Denial or approval reason.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match &self.verdict {
            Verdict::Allowed => None,
            Verdict::RequiresApproval { reason, .. } | Verdict::Denied { reason } => Some(reason),
        }
    }
}

impl fmt::Display for PolicyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.verdict {
            Verdict::Allowed => write!(f, "allowed"),
            Verdict::RequiresApproval {
                reason,
                approver_group,
            } => write!(
                f,
                "requires approval by {}: {reason}",
                approver_group.as_deref().unwrap_or("default approver")
            ),
            Verdict::Denied { reason } => write!(f, "denied: {reason}"),
        }
    }
}

/// Pending approval remembered while later checks run.
struct Pending {
    reason: String,
    approver_group: Option<String>,
}

struct Trace {
    rules: Vec<String>,
    estimated_cost: Option<f64>,
}

impl Trace {
    fn new() -> Self {
        Self {
            rules: Vec::new(),
            estimated_cost: None,
        }
    }

    fn check(&mut self, rule: &str) {
        self.rules.push(rule.to_owned());
    }

    fn finish(self, verdict: Verdict) -> PolicyResult {
        PolicyResult {
            verdict,
            rules_evaluated: self.rules,
            estimated_cost: self.estimated_cost,
        }
    }

    fn deny(self, reason: impl Into<String>) -> PolicyResult {
        self.finish(Verdict::Denied {
            reason: reason.into(),
        })
    }
}

/// Evaluate `intent` for `identity`.
///
/// `running_total` is the user's committed hardware spend: the ledger sum
/// plus anything already approved or pending earlier in the same request.
#[must_use]
pub fn evaluate(
    intent: &Intent,
    identity: &Identity,
    running_total: f64,
    policy: &PolicyConfig,
) -> PolicyResult {
    let mut trace = Trace::new();

    trace.check(rules::ACTION_TYPE);
    if intent.action_type == ActionType::Unknown {
        return trace.deny("Could not determine what is being requested; please clarify");
    }

    trace.check(rules::DEPARTMENT_POLICY);
    let Some(role) = policy.role(&identity.department) else {
        return trace.deny(format!(
            "No access policy is defined for department '{}'",
            identity.department
        ));
    };

    match intent.action_type {
        ActionType::RevokeAccess => evaluate_revoke(trace, identity, role),
        ActionType::HardwareRequest => {
            evaluate_hardware(trace, intent, identity, role, running_total)
        },
        ActionType::AccessRequest => evaluate_access(trace, intent, identity, role, policy),
        ActionType::Unknown => trace.deny("Could not determine what is being requested"),
    }
}

fn evaluate_revoke(mut trace: Trace, identity: &Identity, role: &RolePolicy) -> PolicyResult {
    trace.check(rules::REVOKE_PERMISSION);
    if role.can_revoke {
        trace.finish(Verdict::Allowed)
    } else {
        trace.deny(format!(
            "Department '{}' is not permitted to revoke access",
            identity.department
        ))
    }
}

fn evaluate_hardware(
    mut trace: Trace,
    intent: &Intent,
    identity: &Identity,
    role: &RolePolicy,
    running_total: f64,
) -> PolicyResult {
    trace.check(rules::HARDWARE_BUDGET);
    let cost = estimate_hardware_cost(intent);
    trace.estimated_cost = Some(cost);

    let Some(cap) = role.max_hardware_budget else {
        return trace.deny(format!(
            "Department '{}' has no hardware budget",
            identity.department
        ));
    };

    let projected = running_total + cost;
    if projected > cap {
        return trace.deny(format!(
            "Hardware budget exceeded: estimated ${cost:.2} plus ${running_total:.2} already committed \
             is ${projected:.2}, over the ${cap:.2} limit for department '{}'",
            identity.department
        ));
    }
    trace.finish(Verdict::Allowed)
}

fn evaluate_access(
    mut trace: Trace,
    intent: &Intent,
    identity: &Identity,
    role: &RolePolicy,
    policy: &PolicyConfig,
) -> PolicyResult {
    // a. system allow-list
    trace.check(rules::SYSTEM_ACCESS);
    let Some(system) = intent.target_system.as_deref() else {
        return trace.deny("No target system was specified");
    };
    if !role.allows_system(system) {
        return trace.deny(format!(
            "Unauthorized system access: department '{}' is not permitted to access '{system}'",
            identity.department
        ));
    }

    let Some(service) = policy.service(system) else {
        return trace.finish(Verdict::Allowed);
    };
    let resource = intent.target_resource.as_deref();
    let action = intent.requested_action.as_deref();
    let mut pending: Option<Pending> = None;

    // b. resource catalog
    if let Some(resource) = resource {
        trace.check(rules::RESOURCE_EXISTS);
        if !service.has_resource(resource) {
            return trace.deny(format!("Resource '{resource}' does not exist in {system}"));
        }
    }

    // c. sensitive actions
    if let Some(action) = action {
        trace.check(rules::SENSITIVE_ACTION);
        if let Some(rule) = service.sensitive_rule(action) {
            match rule.rule {
                SensitiveRuleKind::Deny => {
                    return trace.deny(rule.reason.clone().unwrap_or_else(|| {
                        format!("Action '{action}' on {system} is not permitted")
                    }));
                },
                SensitiveRuleKind::RequiresApproval => {
                    pending = Some(Pending {
                        reason: rule.reason.clone().unwrap_or_else(|| {
                            format!("Action '{action}' on {system} is sensitive")
                        }),
                        approver_group: rule
                            .approver_group
                            .clone()
                            .or_else(|| service.default_approver.clone()),
                    });
                },
            }
        }
    }

    // d. resource group restriction
    if let Some(resource) = resource
        && let Some(groups) = service.allowed_groups(resource, action)
    {
        trace.check(rules::RESOURCE_GROUP_RESTRICTION);
        if !identity.belongs_to_any(groups) {
            return trace.deny(format!(
                "Resource '{resource}' on {system} is restricted to: {}",
                groups.join(", ")
            ));
        }
    }

    // e. service sub-policy
    if let Some(resource) = resource {
        match channel_check(service, resource) {
            ChannelOutcome::NotApplicable => {},
            ChannelOutcome::Restricted => {
                trace.check(rules::CHANNEL_POLICY);
                return trace.deny(format!(
                    "Channel '{resource}' is restricted and cannot be granted through this process"
                ));
            },
            ChannelOutcome::AutoApproved => {
                trace.check(rules::CHANNEL_POLICY);
                pending = None;
            },
            ChannelOutcome::NeedsApproval(approver_group) => {
                trace.check(rules::CHANNEL_POLICY);
                // A sensitive-action rule keeps its own reason and approver.
                if pending.is_none() {
                    pending = Some(Pending {
                        reason: format!("Channel '{resource}' requires approval to join"),
                        approver_group,
                    });
                }
            },
        }
    }

    match pending {
        Some(p) => trace.finish(Verdict::RequiresApproval {
            reason: p.reason,
            approver_group: p.approver_group,
        }),
        None => trace.finish(Verdict::Allowed),
    }
}

enum ChannelOutcome {
    NotApplicable,
    Restricted,
    AutoApproved,
    NeedsApproval(Option<String>),
}

fn channel_check(service: &ServicePolicy, channel: &str) -> ChannelOutcome {
    let Some(channels) = &service.channel_policy else {
        return ChannelOutcome::NotApplicable;
    };
    if channels.is_restricted(channel) {
        ChannelOutcome::Restricted
    } else if channels.is_auto_approved(channel) {
        ChannelOutcome::AutoApproved
    } else {
        ChannelOutcome::NeedsApproval(
            channels
                .approver_group
                .clone()
                .or_else(|| service.default_approver.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = r##"{
        "services": {
            "slack": {
                "valid_actions": ["join_channel", "create_channel", "delete_workspace"],
                "resources": ["#general", "#fde-updates", "#exec", "#secret", "#random"],
                "sensitive_actions": {
                    "delete_workspace": {"rule": "DENY", "reason": "Workspace deletion is never self-service"},
                    "create_channel": {"rule": "REQUIRES_APPROVAL", "approver_group": "slack-admins"}
                },
                "resource_restrictions": {"#exec": {"*": ["executives"]}},
                "default_approver": "slack-admins",
                "channel_policy": {"auto_approve": ["#general", "#random"], "restricted": ["#secret"]}
            },
            "aws": {
                "valid_actions": ["read", "write"],
                "resources": [],
                "sensitive_actions": {"write": {"rule": "REQUIRES_APPROVAL"}},
                "default_approver": "cloud-admins"
            }
        },
        "roles": {
            "Engineering": {"allowed_systems": ["slack", "aws"], "max_hardware_budget": 3000},
            "Finance": {"allowed_systems": ["slack"], "max_hardware_budget": 2000},
            "Interns": {"allowed_systems": ["slack"], "max_hardware_budget": 1500},
            "Sales": {"allowed_systems": ["slack"]},
            "IT": {"allowed_systems": ["*"], "can_revoke": true}
        }
    }"##;

    fn policy() -> PolicyConfig {
        PolicyConfig::from_json_str(POLICY).unwrap()
    }

    fn slack(resource: &str) -> Intent {
        Intent::new(ActionType::AccessRequest, 0.95)
            .with_system("slack")
            .with_resource(resource)
            .with_action("join_channel")
    }

    fn who(department: &str) -> Identity {
        Identity::new("user@corp.com", department)
    }

    #[test]
    fn test_channel_name_without_hash_matches_catalog() {
        let pending = evaluate(&slack("fde-updates"), &who("Engineering"), 0.0, &policy());
        assert!(pending.requires_approval(), "{pending}");

        let auto = evaluate(&slack("General"), &who("Engineering"), 0.0, &policy());
        assert_eq!(auto.verdict, Verdict::Allowed);

        let restricted = evaluate(&slack("secret"), &who("Engineering"), 0.0, &policy());
        assert!(restricted.reason().unwrap().contains("restricted"));
    }

    #[test]
    fn test_sensitive_approver_survives_channel_policy() {
        let policy = PolicyConfig::from_json_str(
            r##"{
                "services": {
                    "slack": {
                        "sensitive_actions": {
                            "create_channel": {
                                "rule": "REQUIRES_APPROVAL",
                                "approver_group": "workspace-owners",
                                "reason": "New channels need an owner"
                            }
                        },
                        "default_approver": "slack-admins",
                        "channel_policy": {"auto_approve": ["#general"]}
                    }
                },
                "roles": {"Engineering": {"allowed_systems": ["slack"]}}
            }"##,
        )
        .unwrap();
        let intent = Intent::new(ActionType::AccessRequest, 0.95)
            .with_system("slack")
            .with_resource("#launch")
            .with_action("create_channel");

        let result = evaluate(&intent, &who("Engineering"), 0.0, &policy);
        assert_eq!(
            result.verdict,
            Verdict::RequiresApproval {
                reason: "New channels need an owner".to_owned(),
                approver_group: Some("workspace-owners".to_owned()),
            }
        );
    }

    #[test]
    fn test_channel_outside_lists_requires_approval() {
        let result = evaluate(&slack("#fde-updates"), &who("Engineering"), 0.0, &policy());
        assert!(result.requires_approval());
        assert_eq!(
            result.verdict,
            Verdict::RequiresApproval {
                reason: "Channel '#fde-updates' requires approval to join".into(),
                approver_group: Some("slack-admins".into()),
            }
        );
        assert_eq!(
            result.rules_evaluated,
            vec![
                "action_type",
                "department_policy",
                "system_access",
                "resource_exists",
                "sensitive_action",
                "channel_policy"
            ]
        );
    }

    #[test]
    fn test_auto_approved_channel_is_allowed() {
        let result = evaluate(&slack("#General"), &who("Engineering"), 0.0, &policy());
        assert_eq!(result.verdict, Verdict::Allowed);
    }

    #[test]
    fn test_auto_approve_clears_sensitive_approval() {
        let intent = Intent::new(ActionType::AccessRequest, 0.95)
            .with_system("slack")
            .with_resource("#random")
            .with_action("create_channel");
        let result = evaluate(&intent, &who("Engineering"), 0.0, &policy());
        assert_eq!(result.verdict, Verdict::Allowed);
    }

    #[test]
    fn test_restricted_channel_denied() {
        let result = evaluate(&slack("#secret"), &who("Engineering"), 0.0, &policy());
        assert!(!result.is_allowed());
        assert_eq!(result.rules_evaluated.last().map(String::as_str), Some("channel_policy"));
    }

    #[test]
    fn test_unauthorized_system() {
        let intent = Intent::new(ActionType::AccessRequest, 0.95)
            .with_system("aws")
            .with_resource("prod-bucket")
            .with_action("read");
        let result = evaluate(&intent, &who("Finance"), 0.0, &policy());
        assert!(!result.is_allowed());
        assert!(result.reason().unwrap().contains("Unauthorized system access"));
        assert_eq!(result.rules_evaluated.last().map(String::as_str), Some("system_access"));
    }

    #[test]
    fn test_sensitive_deny_stops_evaluation() {
        let intent = Intent::new(ActionType::AccessRequest, 0.95)
            .with_system("slack")
            .with_resource("#general")
            .with_action("delete_workspace");
        let result = evaluate(&intent, &who("Engineering"), 0.0, &policy());
        assert_eq!(result.reason(), Some("Workspace deletion is never self-service"));
        assert!(!result.rules_evaluated.iter().any(|r| r == "channel_policy"));
    }

    #[test]
    fn test_sensitive_approval_falls_back_to_service_approver() {
        let intent = Intent::new(ActionType::AccessRequest, 0.95)
            .with_system("aws")
            .with_resource("prod-bucket")
            .with_action("write");
        let result = evaluate(&intent, &who("Engineering"), 0.0, &policy());
        assert!(matches!(
            result.verdict,
            Verdict::RequiresApproval { approver_group: Some(ref g), .. } if g == "cloud-admins"
        ));
    }

    #[test]
    fn test_unknown_resource_denied() {
        let result = evaluate(&slack("#nope"), &who("Engineering"), 0.0, &policy());
        assert_eq!(result.reason(), Some("Resource '#nope' does not exist in slack"));
    }

    #[test]
    fn test_group_restriction() {
        let denied = evaluate(&slack("#exec"), &who("Engineering"), 0.0, &policy());
        assert!(!denied.is_allowed());

        let exec = who("Engineering").with_group("Executives");
        let allowed = evaluate(&slack("#exec"), &exec, 0.0, &policy());
        assert!(allowed.is_allowed());
        assert!(allowed.rules_evaluated.iter().any(|r| r == "resource_group_restriction"));
    }

    #[test]
    fn test_hardware_within_and_over_cap() {
        let air = Intent::new(ActionType::HardwareRequest, 0.9).with_resource("MacBook Air");
        let ok = evaluate(&air, &who("Interns"), 0.0, &policy());
        assert_eq!(ok.verdict, Verdict::Allowed);
        assert_eq!(ok.estimated_cost, Some(1200.0));

        let monitor = Intent::new(ActionType::HardwareRequest, 0.9).with_resource("4K monitor");
        let over = evaluate(&monitor, &who("Interns"), 1200.0, &policy());
        assert!(!over.is_allowed());
        assert_eq!(over.estimated_cost, Some(800.0));
    }

    #[test]
    fn test_hardware_exactly_at_cap_is_allowed() {
        let monitor = Intent::new(ActionType::HardwareRequest, 0.9).with_resource("4K monitor");
        let result = evaluate(&monitor, &who("Interns"), 700.0, &policy());
        assert!(result.is_allowed());
    }

    #[test]
    fn test_hardware_without_cap_denied() {
        let mouse = Intent::new(ActionType::HardwareRequest, 0.9).with_resource("mouse");
        let result = evaluate(&mouse, &who("Sales"), 0.0, &policy());
        assert!(result.reason().unwrap().contains("no hardware budget"));
    }

    #[test]
    fn test_revoke_requires_capability() {
        let intent = Intent::new(ActionType::RevokeAccess, 0.9)
            .with_system("okta")
            .with_target_user("bob@corp.com");
        assert!(!evaluate(&intent, &who("Engineering"), 0.0, &policy()).is_allowed());
        let it = evaluate(&intent, &who("it"), 0.0, &policy());
        assert_eq!(it.verdict, Verdict::Allowed);
        assert_eq!(it.rules_evaluated.last().map(String::as_str), Some("revoke_permission"));
    }

    #[test]
    fn test_unknown_department_and_type() {
        let result = evaluate(&slack("#general"), &who("Marketing"), 0.0, &policy());
        assert_eq!(result.rules_evaluated, vec!["action_type", "department_policy"]);
        assert!(!result.is_allowed());

        let unknown = Intent::new(ActionType::Unknown, 0.2);
        let result = evaluate(&unknown, &who("Engineering"), 0.0, &policy());
        assert_eq!(result.rules_evaluated, vec!["action_type"]);
    }

    #[test]
    fn test_wildcard_role_on_undeclared_service_is_allowed() {
        let intent = Intent::new(ActionType::AccessRequest, 0.9)
            .with_system("github")
            .with_resource("infra");
        let result = evaluate(&intent, &who("IT"), 0.0, &policy());
        assert_eq!(result.verdict, Verdict::Allowed);
    }

    #[test]
    fn test_result_serializes_with_trace() {
        let result = evaluate(&slack("#secret"), &who("Engineering"), 0.0, &policy());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["verdict"], "denied");
        assert!(json["rules_evaluated"].is_array());
    }
}
