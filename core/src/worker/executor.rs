//! Worker execution: verb dispatch and state reporting

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;

use crate::event::EngineEvent;
use crate::node::Node;
use crate::operation::{Operation, OperationId, OperationState, Verb};
use crate::traits::{ContentCheck, NodePayload, Operator, OperatorError};

/// Per-operation worker task.
///
/// State machine: running -> checking -> {completed, failed}. A worker that
/// fails never transitions further; there are no retries across states.
pub struct OperationWorker {
    pub(crate) op_id: OperationId,
    pub(crate) verb: Verb,
    pub(crate) node: Node,
    pub(crate) root_url: String,
    pub(crate) operators: Arc<dyn Operator>,
    pub(crate) checker: Arc<dyn ContentCheck>,
    events_tx: mpsc::Sender<EngineEvent>,
}

impl OperationWorker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        op_id: OperationId,
        verb: Verb,
        node: Node,
        root_url: String,
        operators: Arc<dyn Operator>,
        checker: Arc<dyn ContentCheck>,
        events_tx: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            op_id,
            verb,
            node,
            root_url,
            operators,
            checker,
            events_tx,
        }
    }

    /// Run the operation to a terminal state.
    ///
    /// Returns the final operation record; the scheduler receives the same
    /// record through the event channel and does not await the task.
    pub async fn run(mut self) -> Operation {
        tracing::debug!(
            operation = %self.op_id,
            verb = %self.verb,
            node = %self.node.id,
            "worker started"
        );

        // Optimistic report before the operator call, so the spawn policy
        // does not pick this node again while the effect is pending.
        match self.verb {
            Verb::Create => self.report_node(true, false, false).await,
            Verb::Update | Verb::Delete => self.report_node(true, true, true).await,
        }

        let mut op = Operation::spawned(self.op_id.clone(), self.verb, self.node.clone());

        let payload = match self.execute_verb().await {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(operation = %self.op_id, error = %error, "operator call failed");
                op.error = Some(error.to_string());
                op.state = OperationState::Failed;
                // No node report here: the target stays in_flight and drops
                // out of scheduling consideration.
                self.send_operation(&op).await;
                return op;
            }
        };

        if let Some(payload) = payload {
            if let Err(error) = payload.validate() {
                tracing::error!(
                    operation = %self.op_id,
                    error = %error,
                    "operator payload failed validation, aborting run"
                );
                let _ = self.events_tx.send(EngineEvent::Fatal(error)).await;
                return op;
            }
            payload.apply_to(&mut self.node);
        }

        // Latency is measured from operator completion, not from spawn.
        let started = Instant::now();

        match self.verb {
            Verb::Create => self.report_node(true, true, false).await,
            Verb::Update | Verb::Delete => self.report_node(true, false, true).await,
        }

        op.node = self.node.clone();
        op.state = OperationState::Checking;
        self.send_operation(&op).await;

        self.poll_until_converged(&mut op).await;

        let latency = started.elapsed();
        op.latency = Some(latency);
        op.completed_at = Some(Utc::now());

        match self.verb {
            Verb::Create => self.report_node(false, true, true).await,
            Verb::Update | Verb::Delete => self.report_node(false, false, true).await,
        }

        op.node = self.node.clone();
        op.state = OperationState::Completed;
        tracing::info!(
            operation = %self.op_id,
            latency = %humantime::format_duration(latency),
            checks = op.check_count,
            "operation converged"
        );
        self.send_operation(&op).await;

        op
    }

    /// Dispatch the verb through the operator adapter.
    ///
    /// Create and update return a payload; delete proceeds with the existing
    /// node snapshot.
    async fn execute_verb(&self) -> Result<Option<NodePayload>, OperatorError> {
        match self.verb {
            Verb::Create => self.operators.create(&self.node.id).await.map(Some),
            Verb::Update => self.operators.update(&self.node).await.map(Some),
            Verb::Delete => self.operators.delete(&self.node).await.map(|()| None),
        }
    }

    /// Send an updated node snapshot to the scheduler
    async fn report_node(&mut self, in_flight: bool, exists_on_cms: bool, published: bool) {
        self.node.in_flight = in_flight;
        self.node.exists_on_cms = exists_on_cms;
        self.node.published = published;
        let _ = self
            .events_tx
            .send(EngineEvent::NodeUpdated(self.node.clone()))
            .await;
    }

    /// Send an operation record snapshot to the scheduler
    pub(crate) async fn send_operation(&self, op: &Operation) {
        let _ = self
            .events_tx
            .send(EngineEvent::OperationUpdated(op.clone()))
            .await;
    }
}

impl std::fmt::Debug for OperationWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationWorker")
            .field("op_id", &self.op_id)
            .field("verb", &self.verb)
            .field("node", &self.node.id)
            .finish()
    }
}
