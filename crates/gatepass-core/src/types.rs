use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity id and access code bound to a recognized label.
///
/// Both fields are opaque strings and are forwarded verbatim.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    #[serde(rename = "person_id")]
    pub identity_id: String,
    #[serde(rename = "person_code")]
    pub access_code: String,
}

impl CredentialPair {
    pub fn new(identity_id: impl Into<String>, access_code: impl Into<String>) -> Self {
        Self {
            identity_id: identity_id.into(),
            access_code: access_code.into(),
        }
    }
}

// Access codes must never reach the logs, including through `{:?}`.
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("identity_id", &self.identity_id)
            .field("access_code", &"<redacted>")
            .finish()
    }
}

/// Outcome of looking a label up in the credential mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    Resolved(CredentialPair),
    /// The label has no mapping. Not an error; nothing is delivered.
    Unresolved(String),
}

impl ResolutionResult {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionResult::Resolved(_))
    }

    pub fn credentials(&self) -> Option<&CredentialPair> {
        match self {
            ResolutionResult::Resolved(pair) => Some(pair),
            ResolutionResult::Unresolved(_) => None,
        }
    }
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The HTTP transaction completed. `status` is informational unless
    /// strict status checking is enabled.
    Success { status: u16 },
    Failure { reason: String },
}

impl DeliveryOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        DeliveryOutcome::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Success { .. })
    }
}

/// Best-scoring observation produced by the external classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Classification {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence: Some(confidence),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_pair_debug_redacts_code() {
        let pair = CredentialPair::new("2", "9101");
        let dbg = format!("{pair:?}");
        assert!(dbg.contains("\"2\""));
        assert!(!dbg.contains("9101"));
    }

    #[test]
    fn test_credential_pair_wire_field_names() {
        let pair = CredentialPair::new("0", "1234");
        let value = serde_json::to_value(&pair).unwrap();
        assert_eq!(value, serde_json::json!({"person_id": "0", "person_code": "1234"}));
    }

    #[test]
    fn test_resolution_credentials() {
        let resolved = ResolutionResult::Resolved(CredentialPair::new("1", "5678"));
        assert!(resolved.is_resolved());
        assert_eq!(resolved.credentials().map(|p| p.identity_id.as_str()), Some("1"));

        let unresolved = ResolutionResult::Unresolved("nobody".into());
        assert!(!unresolved.is_resolved());
        assert!(unresolved.credentials().is_none());
    }

    #[test]
    fn test_classification_confidence_optional() {
        let c: Classification = serde_json::from_str(r#"{"label":"0 Jeff_bezos"}"#).unwrap();
        assert_eq!(c, Classification::new("0 Jeff_bezos"));
    }
}
