//! Run summary statistics

use std::time::Duration;

use crate::operation::{Operation, OperationState};

/// Aggregate summary of a finished run, computed once at done entry.
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Wall-clock duration of the whole run
    pub total_duration: Duration,

    /// Total operations spawned
    pub operations: usize,

    /// Operations that reached completed
    pub completed: usize,

    /// Operations that reached failed
    pub failed: usize,

    /// Mean publish/removal latency across all operations.
    ///
    /// Undefined (`None`) when any operation never recorded a latency; via
    /// the done path this cannot happen, since done requires every operation
    /// to be completed.
    pub mean_latency: Option<Duration>,
}

impl RunStats {
    /// Aggregate statistics over the scheduler's operation records
    pub fn aggregate(operations: &[Operation], total_duration: Duration) -> Self {
        let completed = operations
            .iter()
            .filter(|op| op.state == OperationState::Completed)
            .count();
        let failed = operations
            .iter()
            .filter(|op| op.state == OperationState::Failed)
            .count();

        let mean_latency = if operations.is_empty()
            || operations.iter().any(|op| op.latency.is_none())
        {
            None
        } else {
            let total: Duration = operations.iter().filter_map(|op| op.latency).sum();
            Some(total / operations.len() as u32)
        };

        Self {
            total_duration,
            operations: operations.len(),
            completed,
            failed,
            mean_latency,
        }
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mean = match self.mean_latency {
            Some(latency) => humantime::format_duration(truncate_to_millis(latency)).to_string(),
            None => "n/a".to_string(),
        };
        write!(
            f,
            "{} operations in {}, mean latency {}",
            self.operations,
            humantime::format_duration(truncate_to_millis(self.total_duration)),
            mean
        )
    }
}

/// Drop sub-millisecond noise before formatting for humans
fn truncate_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}
