//! Events flowing from operation workers to the scheduler
//!
//! Workers never touch the registry or the operations list directly; every
//! observable effect travels through one of these messages and is folded in
//! by the single scheduler task.

use crate::node::Node;
use crate::operation::Operation;
use crate::traits::ValidationError;

/// One-way message from a worker task to the scheduler
#[derive(Debug)]
pub enum EngineEvent {
    /// Updated node snapshot, merged into the registry last-write-wins
    NodeUpdated(Node),

    /// Operation record snapshot sent after a worker state transition
    OperationUpdated(Operation),

    /// An operator payload failed required-field validation; aborts the run
    Fatal(ValidationError),
}
