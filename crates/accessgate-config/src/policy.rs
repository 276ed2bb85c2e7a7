//! Access policy document.
//!
//! The policy is a JSON object with two maps:
//!
//! ```json
//! {
//!   "services": {
//!     "slack": {
//!       "valid_actions": ["join_channel"],
//!       "resources": ["#general", "#fde-updates"],
//!       "default_approver": "slack-admins",
//!       "channel_policy": {"auto_approve": ["#general"], "restricted": ["#exec"]}
//!     }
//!   },
//!   "roles": {
//!     "Engineering": {"allowed_systems": ["slack", "aws"], "max_hardware_budget": 3000}
//!   }
//! }
//! ```
//!
//! Service names and allow-list entries are lower-cased on load. Lookups of
//! actions, resources, channels and groups are case-insensitive.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Wildcard entry in a role's `allowed_systems`.
pub const WILDCARD: &str = "*";

/// Root policy document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Per-service rules keyed by lower-cased service name.
    #[serde(default)]
    pub services: BTreeMap<String, ServicePolicy>,
    /// Per-department rules keyed by department name.
    #[serde(default)]
    pub roles: BTreeMap<String, RolePolicy>,
}

impl PolicyConfig {
    /// Parse a policy document and normalize its names.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the document does not match the schema.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        let parsed: Self = serde_json::from_str(json)?;
        Ok(parsed.normalized())
    }

    /// Lower-case service keys and allow-list entries, and fill in service
    /// kinds inferred from well-known names.
    #[must_use]
    pub fn normalized(self) -> Self {
        let services = self
            .services
            .into_iter()
            .map(|(name, mut service)| {
                let name = name.trim().to_lowercase();
                service.kind = service.kind.or_else(|| ServiceKind::infer(&name));
                (name, service)
            })
            .collect();
        let roles = self
            .roles
            .into_iter()
            .map(|(name, mut role)| {
                role.allowed_systems = role
                    .allowed_systems
                    .iter()
                    .map(|s| s.trim().to_lowercase())
                    .collect();
                (name, role)
            })
            .collect();
        Self { services, roles }
    }

    /// Look up a service by name (case-insensitive).
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&ServicePolicy> {
        self.services.get(&name.trim().to_lowercase())
    }

    /// Whether the service is declared.
    #[must_use]
    pub fn is_known_service(&self, name: &str) -> bool {
        self.service(name).is_some()
    }

    /// Look up a department's role, trying an exact match first and then a
    /// case-insensitive one.
    #[must_use]
    pub fn role(&self, department: &str) -> Option<&RolePolicy> {
        self.roles.get(department).or_else(|| {
            self.roles
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(department.trim()))
                .map(|(_, role)| role)
        })
    }
}

/// Which payload family a service produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Chat workspace; access means joining a channel.
    Chat,
    /// Cloud IAM; access means a role grant.
    CloudIam,
    /// Ticketing system; access means a project permission.
    Ticketing,
    /// Identity directory; handles revocations.
    Directory,
}

impl ServiceKind {
    /// Infer a kind from a well-known service name.
    #[must_use]
    pub fn infer(service_name: &str) -> Option<Self> {
        match service_name.trim().to_lowercase().as_str() {
            "slack" | "teams" | "discord" => Some(Self::Chat),
            "aws" | "gcp" | "azure" => Some(Self::CloudIam),
            "jira" | "linear" | "servicenow" => Some(Self::Ticketing),
            "okta" | "directory" | "ldap" | "active_directory" => Some(Self::Directory),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => write!(f, "chat"),
            Self::CloudIam => write!(f, "cloud_iam"),
            Self::Ticketing => write!(f, "ticketing"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// Rules for one service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicePolicy {
    /// Payload family. Inferred from the service name when absent.
    #[serde(default)]
    pub kind: Option<ServiceKind>,
    /// Actions this service understands. Empty means any action.
    #[serde(default, alias = "actions")]
    pub valid_actions: Vec<String>,
    /// Resource catalog. Empty disables the existence check.
    #[serde(default, alias = "known_resources")]
    pub resources: Vec<String>,
    /// Action name → sensitive-action rule.
    #[serde(default)]
    pub sensitive_actions: BTreeMap<String, SensitiveRule>,
    /// Resource → action (or `*`) → groups allowed to perform it.
    #[serde(default)]
    pub resource_restrictions: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// Approver group used when a rule does not name one.
    #[serde(default)]
    pub default_approver: Option<String>,
    /// Chat-channel sub-policy.
    #[serde(default)]
    pub channel_policy: Option<ChannelPolicy>,
    /// Access level (e.g. `read`) → provider role name (e.g. `ReadOnlyAccess`).
    #[serde(default)]
    pub access_levels: BTreeMap<String, String>,
}

impl ServicePolicy {
    /// Declared kind, or the kind inferred from `service_name`.
    #[must_use]
    pub fn kind_for(&self, service_name: &str) -> Option<ServiceKind> {
        self.kind.or_else(|| ServiceKind::infer(service_name))
    }

    /// Whether `action` is valid for this service.
    #[must_use]
    pub fn is_valid_action(&self, action: &str) -> bool {
        self.valid_actions.is_empty()
            || self
                .valid_actions
                .iter()
                .any(|a| a.eq_ignore_ascii_case(action.trim()))
    }

    /// Whether `resource` is in the catalog. Always true for an empty catalog.
    ///
    /// Chat services compare channel names the way [`ChannelPolicy`] does.
    #[must_use]
    pub fn has_resource(&self, resource: &str) -> bool {
        self.resources.is_empty()
            || self
                .resources
                .iter()
                .any(|r| self.same_resource(r, resource))
    }

    /// The catalog's spelling of `resource`, if it is listed.
    #[must_use]
    pub fn catalog_name(&self, resource: &str) -> Option<&str> {
        self.resources
            .iter()
            .find(|r| self.same_resource(r, resource))
            .map(String::as_str)
    }

    fn is_chat(&self) -> bool {
        self.kind == Some(ServiceKind::Chat) || self.channel_policy.is_some()
    }

    fn same_resource(&self, known: &str, wanted: &str) -> bool {
        if self.is_chat() {
            same_channel(known, wanted)
        } else {
            known.trim().eq_ignore_ascii_case(wanted.trim())
        }
    }

    /// The sensitive-action rule for `action`, if any.
    #[must_use]
    pub fn sensitive_rule(&self, action: &str) -> Option<&SensitiveRule> {
        self.sensitive_actions
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(action.trim()))
            .map(|(_, rule)| rule)
    }

    /// Groups allowed to perform `action` on `resource`, if restricted.
    ///
    /// An exact action entry wins over a `*` entry.
    #[must_use]
    pub fn allowed_groups(&self, resource: &str, action: Option<&str>) -> Option<&[String]> {
        let by_action = self
            .resource_restrictions
            .iter()
            .find(|(name, _)| self.same_resource(name, resource))
            .map(|(_, actions)| actions)?;

        action
            .and_then(|action| {
                by_action
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(action.trim()))
            })
            .or_else(|| by_action.iter().find(|(name, _)| name.as_str() == WILDCARD))
            .map(|(_, groups)| groups.as_slice())
    }

    /// Provider role for an access level.
    #[must_use]
    pub fn role_for_level(&self, level: &str) -> Option<&str> {
        self.access_levels
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(level.trim()))
            .map(|(_, role)| role.as_str())
    }
}

/// What a sensitive action triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensitiveRuleKind {
    /// Never allowed.
    Deny,
    /// Allowed only after out-of-band approval.
    RequiresApproval,
}

/// A sensitive-action rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitiveRule {
    /// Deny or require approval.
    pub rule: SensitiveRuleKind,
    /// Who approves, for `REQUIRES_APPROVAL`.
    #[serde(default)]
    pub approver_group: Option<String>,
    /// Optional human-readable explanation.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Chat-channel sub-policy layered on top of the generic rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelPolicy {
    /// Channels anyone allowed on the service may join without approval.
    #[serde(default)]
    pub auto_approve: Vec<String>,
    /// Channels that are never granted through this pipeline.
    #[serde(default)]
    pub restricted: Vec<String>,
    /// Approver for every other channel.
    #[serde(default)]
    pub approver_group: Option<String>,
}

impl ChannelPolicy {
    /// Whether `channel` is restricted.
    #[must_use]
    pub fn is_restricted(&self, channel: &str) -> bool {
        contains_channel(&self.restricted, channel)
    }

    /// Whether `channel` is auto-approved.
    #[must_use]
    pub fn is_auto_approved(&self, channel: &str) -> bool {
        contains_channel(&self.auto_approve, channel)
    }
}

/// Channel names compare without a leading `#` and without case.
fn same_channel(a: &str, b: &str) -> bool {
    a.trim()
        .trim_start_matches('#')
        .eq_ignore_ascii_case(b.trim().trim_start_matches('#'))
}

fn contains_channel(list: &[String], channel: &str) -> bool {
    list.iter().any(|c| same_channel(c, channel))
}

/// Rules for one department.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolePolicy {
    /// Systems this department may request access to; `*` means all.
    #[serde(default)]
    pub allowed_systems: Vec<String>,
    /// Rolling-window hardware cap in dollars. Absent means no hardware.
    #[serde(default)]
    pub max_hardware_budget: Option<f64>,
    /// Whether members may revoke other users' access.
    #[serde(default)]
    pub can_revoke: bool,
}

impl RolePolicy {
    /// Whether `system` is allow-listed for this department.
    #[must_use]
    pub fn allows_system(&self, system: &str) -> bool {
        let system = system.trim().to_lowercase();
        self.allowed_systems
            .iter()
            .any(|s| s == WILDCARD || *s == system)
    }
}
