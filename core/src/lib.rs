//! cms-bench-core: the orchestration engine driving synthetic CMS workloads
//!
//! This crate provides the core of cms-bench, a tool that measures
//! end-to-end publish/removal latency of a content store by driving
//! create/update/delete operations against it and polling the live site
//! until each change is observable:
//!
//! - The engine scheduler (tick loop, spawn policy, done detection)
//! - Operation workers (verb execution and convergence polling)
//! - The node registry and operation records
//! - Collaborator traits (`Operator`, `ContentCheck`)
//! - Run statistics
//!
//! Transport-level implementations of the collaborator traits live in the
//! `cms-bench-operators` crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod node;
pub mod operation;
pub mod traits;
pub mod worker;

pub use channel::ChannelConfig;
pub use config::{ConfigError, EngineConfig};
pub use engine::{
    Engine, EngineBuilder, EngineSnapshot, EngineState, RunStats, ShutdownHandle, TransitionHook,
};
pub use error::{EngineError, EngineResult};
pub use event::EngineEvent;
pub use node::{Node, NodeId, NodeRegistry};
pub use operation::{CheckAttempt, Operation, OperationId, OperationState, Verb};
pub use traits::{
    value_string, CheckError, CheckOutcome, ContentCheck, DeployedQuery, NodePayload,
    NotFoundQuery, Operator, OperatorError, ValidationError,
};
pub use worker::{OperationWorker, WorkerBuilder, CHECK_BACKOFF};

use std::sync::Arc;

/// Run a workload to completion with the given configuration and
/// collaborators.
///
/// Convenience wrapper around [`EngineBuilder`]; the transition callback is
/// invoked synchronously on every scheduler state transition.
pub async fn run(
    config: EngineConfig,
    operators: Arc<dyn Operator>,
    checker: Arc<dyn ContentCheck>,
    on_transition: Option<TransitionHook>,
) -> EngineResult<RunStats> {
    let mut builder = EngineBuilder::new()
        .config(config)
        .operators(operators)
        .checker(checker);

    if let Some(hook) = on_transition {
        builder = builder.on_transition(hook);
    }

    builder.build()?.run().await
}
