//! Convergence polling for the checking state

use std::time::Duration;

use chrono::Utc;

use crate::operation::{CheckAttempt, Operation, Verb};
use crate::traits::{DeployedQuery, NotFoundQuery};

use super::executor::OperationWorker;

/// Fixed backoff between failed convergence checks
pub const CHECK_BACKOFF: Duration = Duration::from_millis(100);

impl OperationWorker {
    /// Poll the content check until the operator's effect is observable.
    ///
    /// Create/update converge when the page returns 200 and the value at the
    /// selector matches the expected value; delete converges when the page
    /// returns 404. There is no attempt cap or deadline: polling continues
    /// until convergence. Transport-level check errors are logged as misses
    /// and retried like any other.
    pub(crate) async fn poll_until_converged(&self, op: &mut Operation) {
        loop {
            let miss = match self.verb {
                Verb::Create | Verb::Update => {
                    let query = DeployedQuery {
                        selector: self.node.selector.clone(),
                        page_path: self.node.page_path.clone(),
                        root_url: self.root_url.clone(),
                    };
                    match self.checker.check_deployed(&query).await {
                        Ok(outcome) if outcome.matches(&self.node.value) => return,
                        Ok(outcome) => format!(
                            "status {}, value {}",
                            outcome.status_code,
                            outcome
                                .value
                                .map(|v| v.to_string())
                                .unwrap_or_else(|| "<none>".into())
                        ),
                        Err(error) => error.to_string(),
                    }
                }
                Verb::Delete => {
                    let query = NotFoundQuery {
                        page_path: self.node.page_path.clone(),
                        root_url: self.root_url.clone(),
                    };
                    match self.checker.check_not_found(&query).await {
                        Ok(outcome) if outcome.is_not_found() => return,
                        Ok(outcome) => format!("status {}", outcome.status_code),
                        Err(error) => error.to_string(),
                    }
                }
            };

            op.checks.push(CheckAttempt {
                result: miss.clone(),
                at: Utc::now(),
            });
            op.check_count += 1;
            tracing::debug!(
                operation = %op.id,
                attempt = op.check_count,
                result = %miss,
                "convergence check missed"
            );

            tokio::time::sleep(CHECK_BACKOFF).await;
        }
    }
}
