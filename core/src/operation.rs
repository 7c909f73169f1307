//! Operation records and their lifecycle states

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::node::Node;

/// The operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// Create a new node in the content store
    Create,
    /// Update an existing node's value
    Update,
    /// Remove a node from the content store
    Delete,
}

impl Verb {
    /// Returns the identifier string for this verb
    pub fn id(&self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Operation identifier: verb prefix plus a monotonic sequence number
/// allocated by the scheduler (e.g. `create-3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Derive an id from a verb and the scheduler's operation counter
    pub fn new(verb: Verb, seq: u64) -> Self {
        OperationId(format!("{}-{}", verb.id(), seq))
    }

    /// View the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationState {
    /// Executing the verb through the operator adapter
    Running,
    /// Operator effect issued; polling for convergence
    Checking,
    /// Convergence observed (terminal)
    Completed,
    /// Operator call failed (terminal; never retried)
    Failed,
}

impl OperationState {
    /// True for Completed and Failed
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Completed | OperationState::Failed)
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationState::Running => "running",
            OperationState::Checking => "checking",
            OperationState::Completed => "completed",
            OperationState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// One unsuccessful convergence attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckAttempt {
    /// What the check observed (status/value mismatch or transport error)
    pub result: String,
    /// When the attempt was made
    pub at: DateTime<Utc>,
}

/// Record of one create/update/delete attempt, as folded in by the scheduler.
///
/// Workers own the live record and send snapshots of it on every state
/// transition; the scheduler's copy is what `done` detection and the
/// transition callback see.
#[derive(Debug, Clone)]
pub struct Operation {
    /// Synthetic operation id (`<verb>-<seq>`)
    pub id: OperationId,

    /// The operation kind
    pub verb: Verb,

    /// Snapshot of the targeted node
    pub node: Node,

    /// Current lifecycle state
    pub state: OperationState,

    /// Log of failed convergence attempts, in order
    pub checks: Vec<CheckAttempt>,

    /// Number of failed convergence attempts
    pub check_count: usize,

    /// Publish/removal latency, measured from operator completion to
    /// convergence. Set only on success.
    pub latency: Option<Duration>,

    /// Wall-clock completion time. Set only on success.
    pub completed_at: Option<DateTime<Utc>>,

    /// Operator error message. Set only on failure.
    pub error: Option<String>,
}

impl Operation {
    /// Create the record for a freshly spawned operation
    pub fn spawned(id: OperationId, verb: Verb, node: Node) -> Self {
        Self {
            id,
            verb,
            node,
            state: OperationState::Running,
            checks: Vec::new(),
            check_count: 0,
            latency: None,
            completed_at: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_id_format() {
        assert_eq!(OperationId::new(Verb::Create, 1).as_str(), "create-1");
        assert_eq!(OperationId::new(Verb::Delete, 12).as_str(), "delete-12");
    }

    #[test]
    fn test_verb_serialization() {
        assert_eq!(serde_json::to_string(&Verb::Create).unwrap(), "\"create\"");
        assert_eq!(serde_json::to_string(&Verb::Update).unwrap(), "\"update\"");
        assert_eq!(serde_json::to_string(&Verb::Delete).unwrap(), "\"delete\"");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OperationState::Running.is_terminal());
        assert!(!OperationState::Checking.is_terminal());
        assert!(OperationState::Completed.is_terminal());
        assert!(OperationState::Failed.is_terminal());
    }

    #[test]
    fn test_spawned_record_defaults() {
        let op = Operation::spawned(
            OperationId::new(Verb::Update, 3),
            Verb::Update,
            Node::new("n1"),
        );
        assert_eq!(op.state, OperationState::Running);
        assert!(op.checks.is_empty());
        assert_eq!(op.check_count, 0);
        assert!(op.latency.is_none());
        assert!(op.completed_at.is_none());
        assert!(op.error.is_none());
    }
}
