//! Caller identity and inbound request types.
//!
//! Identity is asserted by whoever submits the batch. Nothing here verifies
//! it; the pipeline only uses it to look up department policy and group
//! membership.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Who is asking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User email. Also the session and ledger key.
    pub email: String,
    /// Department name, matched against the policy's role table.
    pub department: String,
    /// Directory groups the user claims to belong to.
    #[serde(default)]
    pub groups: Vec<String>,
}

impl Identity {
    /// Create an identity with no groups.
    pub fn new(email: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            department: department.into(),
            groups: Vec::new(),
        }
    }

    /// Add a group membership.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Whether the department or any group matches one of `allowed`
    /// (case-insensitive).
    #[must_use]
    pub fn belongs_to_any(&self, allowed: &[String]) -> bool {
        allowed.iter().any(|a| {
            a.eq_ignore_ascii_case(&self.department)
                || self.groups.iter().any(|g| g.eq_ignore_ascii_case(a))
        })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.email, self.department)
    }
}

/// Wire form of one entry in a request batch.
///
/// ```json
/// {"id": "req-1", "user_email": "a@corp.com", "department": "Engineering",
///  "groups": ["oncall"], "raw_text": "I need read access to the prod S3 bucket"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundRequest {
    /// Caller-assigned request identifier.
    pub id: String,
    /// Requesting user.
    pub user_email: String,
    /// Requesting user's department.
    pub department: String,
    /// Optional group memberships.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Free text as typed by the user.
    pub raw_text: String,
}

/// A validated request ready for the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Caller-assigned request identifier.
    pub id: String,
    /// Who is asking.
    pub identity: Identity,
    /// Free text as typed by the user. Untrusted.
    pub raw_text: String,
}

impl AccessRequest {
    /// Create a request directly.
    pub fn new(id: impl Into<String>, identity: Identity, raw_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            identity,
            raw_text: raw_text.into(),
        }
    }
}

impl TryFrom<InboundRequest> for AccessRequest {
    type Error = CoreError;

    fn try_from(inbound: InboundRequest) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::InvalidRequest {
            id: inbound.id.clone(),
            reason: reason.to_string(),
        };
        if inbound.id.trim().is_empty() {
            return Err(invalid("empty request id"));
        }
        if inbound.user_email.trim().is_empty() {
            return Err(invalid("empty user_email"));
        }

        Ok(Self {
            identity: Identity {
                email: inbound.user_email.trim().to_string(),
                department: inbound.department.trim().to_string(),
                groups: inbound.groups,
            },
            id: inbound.id,
            raw_text: inbound.raw_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_request_deserialize_without_groups() {
        let json = r#"{"id":"r1","user_email":"a@corp.com","department":"Finance","raw_text":"hi"}"#;
        let inbound: InboundRequest = serde_json::from_str(json).unwrap();
        assert!(inbound.groups.is_empty());

        let request = AccessRequest::try_from(inbound).unwrap();
        assert_eq!(request.identity.email, "a@corp.com");
        assert_eq!(request.identity.department, "Finance");
    }

    #[test]
    fn test_inbound_request_rejects_empty_email() {
        let inbound = InboundRequest {
            id: "r1".to_string(),
            user_email: "  ".to_string(),
            department: "Finance".to_string(),
            groups: vec![],
            raw_text: "hi".to_string(),
        };
        let err = AccessRequest::try_from(inbound).unwrap_err();
        assert!(err.to_string().contains("user_email"));
    }

    #[test]
    fn test_belongs_to_any_matches_department_or_group() {
        let identity = Identity::new("a@corp.com", "Engineering").with_group("SRE");

        assert!(identity.belongs_to_any(&["engineering".to_string()]));
        assert!(identity.belongs_to_any(&["sre".to_string()]));
        assert!(!identity.belongs_to_any(&["finance".to_string()]));
        assert!(!identity.belongs_to_any(&[]));
    }
}
