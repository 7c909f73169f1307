//! Builder pattern for worker construction

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{EngineError, EngineResult};
use crate::event::EngineEvent;
use crate::node::Node;
use crate::operation::{OperationId, Verb};
use crate::traits::{ContentCheck, Operator};

use super::executor::OperationWorker;

/// Builder for creating `OperationWorker` instances
///
/// # Example
/// ```ignore
/// let worker = WorkerBuilder::new(op_id)
///     .verb(Verb::Update)
///     .node(node)
///     .root_url("http://localhost:4503")
///     .operators(operators)
///     .checker(checker)
///     .events_tx(tx)
///     .build()?;
/// ```
pub struct WorkerBuilder {
    op_id: OperationId,
    verb: Option<Verb>,
    node: Option<Node>,
    root_url: Option<String>,
    operators: Option<Arc<dyn Operator>>,
    checker: Option<Arc<dyn ContentCheck>>,
    events_tx: Option<mpsc::Sender<EngineEvent>>,
}

impl WorkerBuilder {
    /// Create a new builder for the given operation id
    pub fn new(op_id: OperationId) -> Self {
        Self {
            op_id,
            verb: None,
            node: None,
            root_url: None,
            operators: None,
            checker: None,
            events_tx: None,
        }
    }

    /// Set the operation verb
    pub fn verb(mut self, verb: Verb) -> Self {
        self.verb = Some(verb);
        self
    }

    /// Set the targeted node snapshot
    pub fn node(mut self, node: Node) -> Self {
        self.node = Some(node);
        self
    }

    /// Set the live-site base URL used for convergence checks
    pub fn root_url(mut self, root_url: impl Into<String>) -> Self {
        self.root_url = Some(root_url.into());
        self
    }

    /// Set the operator adapter
    pub fn operators(mut self, operators: Arc<dyn Operator>) -> Self {
        self.operators = Some(operators);
        self
    }

    /// Set the content-check collaborator
    pub fn checker(mut self, checker: Arc<dyn ContentCheck>) -> Self {
        self.checker = Some(checker);
        self
    }

    /// Set the engine event channel sender
    pub fn events_tx(mut self, tx: mpsc::Sender<EngineEvent>) -> Self {
        self.events_tx = Some(tx);
        self
    }

    /// Build the worker
    ///
    /// # Errors
    /// Returns an error if any required field is missing.
    pub fn build(self) -> EngineResult<OperationWorker> {
        let verb = self.verb.ok_or(EngineError::missing_field("verb"))?;
        let node = self.node.ok_or(EngineError::missing_field("node"))?;
        let root_url = self.root_url.ok_or(EngineError::missing_field("root_url"))?;
        let operators = self
            .operators
            .ok_or(EngineError::missing_field("operators"))?;
        let checker = self.checker.ok_or(EngineError::missing_field("checker"))?;
        let events_tx = self
            .events_tx
            .ok_or(EngineError::missing_field("events_tx"))?;

        Ok(OperationWorker::new(
            self.op_id, verb, node, root_url, operators, checker, events_tx,
        ))
    }
}
