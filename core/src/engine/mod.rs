//! Engine scheduler for workload runs
//!
//! The engine is the supervising half of cms-bench's dual-level
//! orchestration:
//!
//! - Ticks on a fixed interval (first tick immediate)
//! - Decides what operation, if any, to spawn each tick under the mode
//!   policy (pool: updates only; lifecycle: a create phase then deletes)
//! - Folds worker events into the node registry and operations list
//! - Detects run completion and reports the run statistics
//!
//! # Example
//!
//! ```ignore
//! use cms_bench_core::{EngineBuilder, EngineConfig};
//!
//! let engine = EngineBuilder::new()
//!     .config(config)
//!     .operators(operators)
//!     .checker(checker)
//!     .build()?;
//!
//! let stats = engine.run_with_signal_handling().await?;
//! println!("{stats}");
//! ```

mod builder;
mod scheduler;
mod stats;

pub use builder::EngineBuilder;
pub use scheduler::{Engine, EngineSnapshot, EngineState, ShutdownHandle, TransitionHook};
pub use stats::RunStats;
