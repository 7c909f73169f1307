//! Operation workers
//!
//! The worker is the per-operation execution unit of cms-bench, responsible
//! for one pass of: **report optimistic state -> execute verb -> poll until
//! convergence -> report final state**.
//!
//! Each worker is a tokio task spawned by the engine scheduler. It owns its
//! operation record and a snapshot of the targeted node; everything the rest
//! of the system learns about it travels through `EngineEvent` messages:
//!
//! 1. Optimistic node report before the operator call (keeps the spawn
//!    policy away from the node)
//! 2. Verb execution through the `Operator` adapter
//! 3. Second optimistic report once the effect is issued
//! 4. Convergence polling against the `ContentCheck` collaborator
//! 5. Final node report and terminal operation snapshot
//!
//! # Example
//!
//! ```ignore
//! let worker = WorkerBuilder::new(op_id)
//!     .verb(Verb::Create)
//!     .node(node)
//!     .root_url("http://localhost:4503")
//!     .operators(operators)
//!     .checker(checker)
//!     .events_tx(tx)
//!     .build()?;
//!
//! tokio::spawn(worker.run());
//! ```

mod builder;
mod executor;
mod poller;

pub use builder::WorkerBuilder;
pub use executor::OperationWorker;
pub use poller::CHECK_BACKOFF;
