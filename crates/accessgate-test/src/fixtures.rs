//! Test fixtures: a sample policy, identities and requests.

use std::io::Write;

use accessgate_config::PolicyConfig;
use accessgate_core::{AccessRequest, Identity, InboundRequest};
use tempfile::NamedTempFile;

/// A policy covering one service of each kind and four departments.
///
/// - `slack`: `#general` and `#random` auto-approved, `#secret` restricted,
///   everything else routed to `slack-admins`
/// - `aws`: access levels `read`/`write`/`admin`; `write` needs approval,
///   `admin` is denied
/// - `jira`, `okta`
/// - Engineering: slack, aws, jira; $3000 hardware
/// - Finance: slack, jira; $2000 hardware
/// - Interns: slack only; $1500 hardware
/// - IT: everything; may revoke
pub const SAMPLE_POLICY_JSON: &str = r##"{
    "services": {
        "slack": {
            "valid_actions": ["join_channel", "create_channel"],
            "resources": ["#general", "#random", "#fde-updates", "#incidents", "#secret"],
            "sensitive_actions": {
                "create_channel": {"rule": "REQUIRES_APPROVAL"}
            },
            "default_approver": "slack-admins",
            "channel_policy": {
                "auto_approve": ["#general", "#random"],
                "restricted": ["#secret"]
            }
        },
        "aws": {
            "valid_actions": ["read", "write", "admin"],
            "sensitive_actions": {
                "write": {"rule": "REQUIRES_APPROVAL", "approver_group": "cloud-admins"},
                "admin": {"rule": "DENY", "reason": "Admin access to AWS is never granted through self-service"}
            },
            "access_levels": {
                "read": "ReadOnlyAccess",
                "write": "PowerUserAccess",
                "admin": "AdministratorAccess"
            },
            "default_approver": "cloud-admins"
        },
        "jira": {
            "valid_actions": ["browse", "edit"],
            "resources": ["PLAT", "OPS"],
            "resource_restrictions": {"OPS": {"edit": ["sre"]}}
        },
        "okta": {
            "valid_actions": ["revoke_access"]
        }
    },
    "roles": {
        "Engineering": {"allowed_systems": ["slack", "aws", "jira"], "max_hardware_budget": 3000},
        "Finance": {"allowed_systems": ["slack", "jira"], "max_hardware_budget": 2000},
        "Interns": {"allowed_systems": ["slack"], "max_hardware_budget": 1500},
        "IT": {"allowed_systems": ["*"], "can_revoke": true}
    }
}"##;

/// The parsed [`SAMPLE_POLICY_JSON`].
#[must_use]
pub fn sample_policy() -> PolicyConfig {
    PolicyConfig::from_json_str(SAMPLE_POLICY_JSON).expect("sample policy must parse")
}

/// [`SAMPLE_POLICY_JSON`] written to a temporary file.
#[must_use]
pub fn sample_policy_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp policy file");
    file.write_all(SAMPLE_POLICY_JSON.as_bytes())
        .expect("write temp policy file");
    file
}

/// An Engineering employee.
#[must_use]
pub fn engineering() -> Identity {
    Identity::new("dev@corp.com", "Engineering")
}

/// A Finance employee.
#[must_use]
pub fn finance() -> Identity {
    Identity::new("analyst@corp.com", "Finance")
}

/// An intern.
#[must_use]
pub fn intern() -> Identity {
    Identity::new("intern@corp.com", "Interns")
}

/// An IT administrator.
#[must_use]
pub fn it_admin() -> Identity {
    Identity::new("admin@corp.com", "IT").with_group("it-admins")
}

/// A request from `identity`.
#[must_use]
pub fn request_from(id: &str, identity: Identity, text: &str) -> AccessRequest {
    AccessRequest::new(id, identity, text)
}

/// The wire form of a request from `identity`.
#[must_use]
pub fn inbound_from(id: &str, identity: &Identity, text: &str) -> InboundRequest {
    InboundRequest {
        id: id.to_owned(),
        user_email: identity.email.clone(),
        department: identity.department.clone(),
        groups: identity.groups.clone(),
        raw_text: text.to_owned(),
    }
}
