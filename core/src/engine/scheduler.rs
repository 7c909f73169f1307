//! Engine scheduler execution

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::event::EngineEvent;
use crate::node::{Node, NodeId, NodeRegistry};
use crate::operation::{Operation, OperationId, OperationState, Verb};
use crate::traits::{ContentCheck, Operator};
use crate::worker::WorkerBuilder;

use super::stats::RunStats;

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Ticking and spawning operations
    Running,
    /// Budget spent and every operation completed (terminal)
    Done,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Running => write!(f, "running"),
            EngineState::Done => write!(f, "done"),
        }
    }
}

/// Snapshot of the engine handed to the transition callback
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    /// Scheduler state at the time of the transition
    pub state: EngineState,
    /// All spawned operation records, in spawn order
    pub operations: Vec<Operation>,
    /// All known nodes, in stable order
    pub nodes: Vec<Node>,
}

/// Callback invoked synchronously on every scheduler state transition
pub type TransitionHook = Box<dyn FnMut(&EngineSnapshot) + Send>;

/// Handle for stopping a running engine from another task.
///
/// Stopping disarms the tick loop only; in-flight workers are abandoned, not
/// cancelled, and their remaining events are never consumed.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: broadcast::Sender<()>,
}

impl ShutdownHandle {
    /// Stop the engine
    pub fn stop(&self) {
        let _ = self.tx.send(());
    }
}

/// The supervising scheduler driving a workload run.
///
/// Owns the node registry and the operations list exclusively; workers only
/// emit events which the scheduler folds in between ticks. Construct via
/// [`super::EngineBuilder`].
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) operators: Arc<dyn Operator>,
    pub(crate) checker: Arc<dyn ContentCheck>,

    events_tx: mpsc::Sender<EngineEvent>,
    events_rx: Option<mpsc::Receiver<EngineEvent>>,
    shutdown_tx: broadcast::Sender<()>,
    on_transition: Option<TransitionHook>,

    state: EngineState,
    operations: Vec<Operation>,
    nodes: NodeRegistry,
    op_seq: u64,
    node_seq: u64,
    created_nodes: usize,
    started_at: Instant,
}

impl Engine {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: EngineConfig,
        operators: Arc<dyn Operator>,
        checker: Arc<dyn ContentCheck>,
        events_tx: mpsc::Sender<EngineEvent>,
        events_rx: mpsc::Receiver<EngineEvent>,
        shutdown_tx: broadcast::Sender<()>,
        on_transition: Option<TransitionHook>,
    ) -> Self {
        Self {
            config,
            operators,
            checker,
            events_tx,
            events_rx: Some(events_rx),
            shutdown_tx,
            on_transition,
            state: EngineState::Running,
            operations: Vec::new(),
            nodes: NodeRegistry::new(),
            op_seq: 0,
            node_seq: 0,
            created_nodes: 0,
            started_at: Instant::now(),
        }
    }

    /// Get the engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get a handle for stopping the engine from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Run the workload to completion.
    ///
    /// Ticks every `config.interval` (first tick immediate), spawning at most
    /// one operation per tick under the mode policy, and returns the run
    /// statistics once the budget is spent and every operation completed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] when an operator payload fails
    /// required-field validation (fatal to the whole run), and
    /// [`EngineError::Stopped`] when the engine is shut down before done.
    pub async fn run(mut self) -> EngineResult<RunStats> {
        self.started_at = Instant::now();

        let mut events_rx = self
            .events_rx
            .take()
            .ok_or_else(|| EngineError::config("engine already running"))?;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        for node in self.config.node_pool.clone() {
            self.nodes.merge(node);
        }

        self.transition(EngineState::Running);
        let mode = if self.config.node_pool_mode() {
            "pool"
        } else {
            "lifecycle"
        };
        tracing::info!(
            operations_limit = self.config.operations_limit,
            interval = ?self.config.interval,
            mode,
            "engine started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    tracing::info!(
                        operations = self.operations.len(),
                        "engine stopped before completion"
                    );
                    return Err(EngineError::Stopped);
                }

                Some(event) = events_rx.recv() => {
                    self.apply_event(event)?;
                }

                _ = ticker.tick() => {
                    if self.done() {
                        let stats =
                            RunStats::aggregate(&self.operations, self.started_at.elapsed());
                        self.transition(EngineState::Done);
                        tracing::info!(summary = %stats, "run complete");
                        return Ok(stats);
                    }
                    self.tick_spawn()?;
                }
            }
        }
    }

    /// Run with an overall deadline; stops the engine when it elapses.
    ///
    /// The default [`run`](Self::run) has no run-level timeout; this is the
    /// explicit opt-in bound for runs that might otherwise hang on a
    /// never-converging or failed operation.
    pub async fn run_with_timeout(self, timeout: Duration) -> EngineResult<RunStats> {
        let shutdown = self.shutdown_handle();

        let timeout_handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::info!("timeout reached, stopping engine");
            shutdown.stop();
        });

        let result = self.run().await;

        timeout_handle.abort();
        result
    }

    /// Run with Ctrl+C handling; stops the engine on the first signal.
    pub async fn run_with_signal_handling(self) -> EngineResult<RunStats> {
        let shutdown = self.shutdown_handle();

        let signal_handle = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("received Ctrl+C, stopping engine");
                    shutdown.stop();
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to listen for Ctrl+C");
                }
            }
        });

        let result = self.run().await;

        signal_handle.abort();
        result
    }

    /// Done condition, checked on every tick before the spawn policy: budget
    /// spent and every operation completed. A failed operation never
    /// satisfies this and blocks done permanently.
    fn done(&self) -> bool {
        self.operations.len() >= self.config.operations_limit
            && self
                .operations
                .iter()
                .all(|op| op.state == OperationState::Completed)
    }

    /// Fold one worker event into the scheduler's state
    fn apply_event(&mut self, event: EngineEvent) -> EngineResult<()> {
        match event {
            EngineEvent::NodeUpdated(node) => {
                tracing::debug!(
                    node = %node.id,
                    in_flight = node.in_flight,
                    exists_on_cms = node.exists_on_cms,
                    published = node.published,
                    "node updated"
                );
                self.nodes.merge(node);
            }
            EngineEvent::OperationUpdated(op) => {
                match self.operations.iter_mut().find(|existing| existing.id == op.id) {
                    Some(slot) => *slot = op,
                    None => {
                        tracing::debug!(operation = %op.id, "report for unknown operation dropped");
                    }
                }
            }
            EngineEvent::Fatal(error) => {
                tracing::error!(error = %error, "fatal validation error, aborting run");
                return Err(EngineError::Validation(error));
            }
        }
        Ok(())
    }

    /// Spawn policy, evaluated once per tick: at most one new operation.
    fn tick_spawn(&mut self) -> EngineResult<()> {
        // Hard ceiling on total spawned operations, not on in-flight ones.
        if self.operations.len() >= self.config.operations_limit {
            return Ok(());
        }

        let plan = if self.config.node_pool_mode() {
            self.plan_pool_tick()
        } else {
            self.plan_lifecycle_tick()
        };

        match plan {
            Some((verb, node)) => self.spawn_worker(verb, node),
            None => {
                tracing::debug!("no eligible node this tick");
                Ok(())
            }
        }
    }

    /// Pool mode: update the first idle node, or wait for one to free up
    fn plan_pool_tick(&self) -> Option<(Verb, Node)> {
        self.nodes.first_idle().cloned().map(|n| (Verb::Update, n))
    }

    /// Lifecycle mode: create until half the budget is spent on distinct
    /// nodes, then delete published nodes as they become idle.
    fn plan_lifecycle_tick(&mut self) -> Option<(Verb, Node)> {
        if self.created_nodes < self.config.operations_limit / 2 {
            self.node_seq += 1;
            self.created_nodes += 1;
            let node = Node::new(NodeId::new(format!("node-{}", self.node_seq)));
            return Some((Verb::Create, node));
        }

        self.nodes
            .first_deletable()
            .cloned()
            .map(|n| (Verb::Delete, n))
    }

    /// Append the operation record and spawn its worker task
    fn spawn_worker(&mut self, verb: Verb, node: Node) -> EngineResult<()> {
        self.op_seq += 1;
        let id = OperationId::new(verb, self.op_seq);
        tracing::info!(operation = %id, verb = %verb, node = %node.id, "spawning operation");

        self.operations
            .push(Operation::spawned(id.clone(), verb, node.clone()));

        let worker = WorkerBuilder::new(id)
            .verb(verb)
            .node(node)
            .root_url(self.config.root_url.clone())
            .operators(Arc::clone(&self.operators))
            .checker(Arc::clone(&self.checker))
            .events_tx(self.events_tx.clone())
            .build()?;

        tokio::spawn(worker.run());
        Ok(())
    }

    /// Record the state change and invoke the transition callback
    fn transition(&mut self, state: EngineState) {
        self.state = state;
        let snapshot = self.snapshot();
        if let Some(hook) = self.on_transition.as_mut() {
            hook(&snapshot);
        }
    }

    /// Build a snapshot of the current engine state
    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state,
            operations: self.operations.clone(),
            nodes: self.nodes.snapshot(),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("operations", &self.operations.len())
            .field("nodes", &self.nodes.len())
            .finish()
    }
}
