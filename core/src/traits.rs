//! Collaborator traits the engine depends on
//!
//! These traits are defined in core to keep the engine free of transport
//! concerns. Implementations live in their own crate (operators/); tests use
//! in-memory mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::{Node, NodeId};

// ============================================================================
// Operator Adapter
// ============================================================================

/// Attributes of a node as reported by the content store after a
/// create/update call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePayload {
    /// Path of the page the node was published on
    pub page_path: Option<String>,

    /// Selector locating the node's value on the page
    pub selector: Option<String>,

    /// The node's published value
    pub value: Option<serde_json::Value>,

    /// Optional free-form context
    pub context: Option<serde_json::Value>,
}

impl NodePayload {
    /// Required-field validation applied to create/update results.
    ///
    /// A failure here is treated as an integration bug and aborts the whole
    /// run, not just the affected operation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page_path.is_none() {
            return Err(ValidationError::MissingField("pagePath"));
        }
        if self.selector.is_none() {
            return Err(ValidationError::MissingField("selector"));
        }
        if self.value.is_none() {
            return Err(ValidationError::MissingField("value"));
        }
        Ok(())
    }

    /// Merge the payload's fields into a node snapshot
    pub fn apply_to(&self, node: &mut Node) {
        if let Some(page_path) = &self.page_path {
            node.page_path = page_path.clone();
        }
        if let Some(selector) = &self.selector {
            node.selector = selector.clone();
        }
        if let Some(value) = &self.value {
            node.value = value.clone();
        }
        if let Some(context) = &self.context {
            node.context = Some(context.clone());
        }
    }
}

/// Payload validation error — fatal to the whole run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required payload field is missing
    #[error("operator payload missing required field: {0}")]
    MissingField(&'static str),
}

/// Operator adapter performing the side-effecting create/update/delete calls
/// against the real content store.
#[async_trait]
pub trait Operator: Send + Sync {
    /// Create a new node; returns its published attributes
    async fn create(&self, node_id: &NodeId) -> Result<NodePayload, OperatorError>;

    /// Update an existing node; returns its published attributes
    async fn update(&self, node: &Node) -> Result<NodePayload, OperatorError>;

    /// Remove a node; no return payload expected
    async fn delete(&self, node: &Node) -> Result<(), OperatorError>;
}

/// Operator-side errors.
///
/// These fail the affected operation only; the run keeps going.
#[derive(Debug, Error)]
pub enum OperatorError {
    /// The call could not be performed (transport, encoding, ...)
    #[error("operator call failed: {0}")]
    Call(String),

    /// The content store rejected the call
    #[error("content store error: {status} - {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Invalid adapter configuration
    #[error("operator configuration error: {0}")]
    Config(String),
}

impl OperatorError {
    /// Create a call-failure error
    pub fn call(msg: impl Into<String>) -> Self {
        OperatorError::Call(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        OperatorError::Config(msg.into())
    }
}

// ============================================================================
// Content-Check Collaborator
// ============================================================================

/// Query for a deployed-value check (create/update convergence)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployedQuery {
    /// Selector locating the value on the page
    pub selector: String,
    /// Path of the page to fetch
    pub page_path: String,
    /// Base URL of the live site
    pub root_url: String,
}

/// Query for a removal check (delete convergence)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotFoundQuery {
    /// Path of the page to fetch
    pub page_path: String,
    /// Base URL of the live site
    pub root_url: String,
}

/// Result of a single content check.
///
/// HTTP error statuses (404 included) are ordinary outcomes, never `Err`;
/// `Err` is reserved for transport-level failures.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// HTTP status code of the page fetch
    pub status_code: u16,
    /// Value found at the selector, if any
    pub value: Option<serde_json::Value>,
}

impl CheckOutcome {
    /// Deployed-check success: status 200 and the observed value's string
    /// form equals the expected value's string form.
    pub fn matches(&self, expected: &serde_json::Value) -> bool {
        self.status_code == 200
            && self
                .value
                .as_ref()
                .is_some_and(|v| value_string(v) == value_string(expected))
    }

    /// Removal-check success: the path now yields 404
    pub fn is_not_found(&self) -> bool {
        self.status_code == 404
    }
}

/// String form used for value comparison. Strings compare without their JSON
/// quoting; everything else compares by its JSON rendering.
pub fn value_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read-side collaborator confirming an operator's effect on the live site.
#[async_trait]
pub trait ContentCheck: Send + Sync {
    /// Fetch the page and report the value visible at the selector
    async fn check_deployed(&self, query: &DeployedQuery) -> Result<CheckOutcome, CheckError>;

    /// Fetch the page and report whether it is gone
    async fn check_not_found(&self, query: &NotFoundQuery) -> Result<CheckOutcome, CheckError>;
}

/// Transport-level check errors; logged and retried by the poller, never
/// fatal.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The page fetch could not be performed
    #[error("check transport error: {0}")]
    Transport(String),

    /// Invalid checker configuration
    #[error("check configuration error: {0}")]
    Config(String),
}

impl CheckError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        CheckError::Transport(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_payload() -> NodePayload {
        NodePayload {
            page_path: Some("/content/n1.html".into()),
            selector: Some("#n1".into()),
            value: Some(json!("v")),
            context: None,
        }
    }

    #[test]
    fn test_payload_validation_ok() {
        assert!(full_payload().validate().is_ok());
    }

    #[test]
    fn test_payload_validation_missing_fields() {
        let mut payload = full_payload();
        payload.selector = None;
        assert_eq!(
            payload.validate(),
            Err(ValidationError::MissingField("selector"))
        );

        let mut payload = full_payload();
        payload.page_path = None;
        assert_eq!(
            payload.validate(),
            Err(ValidationError::MissingField("pagePath"))
        );

        let mut payload = full_payload();
        payload.value = None;
        assert_eq!(
            payload.validate(),
            Err(ValidationError::MissingField("value"))
        );
    }

    #[test]
    fn test_payload_context_is_optional() {
        assert!(full_payload().validate().is_ok());
    }

    #[test]
    fn test_payload_apply_to_merges_fields() {
        let mut node = Node::new("n1");
        full_payload().apply_to(&mut node);
        assert_eq!(node.page_path, "/content/n1.html");
        assert_eq!(node.selector, "#n1");
        assert_eq!(node.value, json!("v"));
    }

    #[test]
    fn test_payload_camel_case_wire_format() {
        let payload: NodePayload =
            serde_json::from_str(r##"{"pagePath":"/p","selector":"#s","value":42}"##).unwrap();
        assert_eq!(payload.page_path.as_deref(), Some("/p"));
        assert_eq!(payload.value, Some(json!(42)));
    }

    #[test]
    fn test_value_string_forms() {
        assert_eq!(value_string(&json!("abc")), "abc");
        assert_eq!(value_string(&json!(42)), "42");
        assert_eq!(value_string(&json!(true)), "true");
    }

    #[test]
    fn test_outcome_matches_on_string_form() {
        let outcome = CheckOutcome {
            status_code: 200,
            value: Some(json!("42")),
        };
        // A numeric expectation matches its string rendering.
        assert!(outcome.matches(&json!(42)));

        let miss = CheckOutcome {
            status_code: 200,
            value: Some(json!("other")),
        };
        assert!(!miss.matches(&json!(42)));
    }

    #[test]
    fn test_outcome_requires_200() {
        let outcome = CheckOutcome {
            status_code: 503,
            value: Some(json!("v")),
        };
        assert!(!outcome.matches(&json!("v")));
    }

    #[test]
    fn test_not_found_outcome() {
        assert!(CheckOutcome {
            status_code: 404,
            value: None
        }
        .is_not_found());
        assert!(!CheckOutcome {
            status_code: 200,
            value: None
        }
        .is_not_found());
    }
}
