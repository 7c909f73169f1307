//! Engine configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::node::Node;

/// Engine configuration.
///
/// Defines how a workload run behaves: tick period, total operation budget,
/// the live site to poll, and an optional seed pool of pre-existing nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tick period of the scheduler
    #[serde(with = "humantime_serde", default = "default_interval")]
    pub interval: Duration,

    /// Total operations to spawn before stopping (hard ceiling on spawned
    /// operations, not on concurrently in-flight ones)
    pub operations_limit: usize,

    /// Base URL of the live site used for convergence checks
    pub root_url: String,

    /// Optional seed pool of pre-existing nodes. Supplying one switches the
    /// scheduler into pool mode (updates only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_pool: Vec<Node>,
}

fn default_interval() -> Duration {
    Duration::from_secs(1)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            operations_limit: 10,
            root_url: String::new(),
            node_pool: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Create a config with the given budget and live-site URL
    pub fn new(operations_limit: usize, root_url: impl Into<String>) -> Self {
        Self {
            operations_limit,
            root_url: root_url.into(),
            ..Default::default()
        }
    }

    /// Set the tick period
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the seed node pool
    pub fn with_node_pool(mut self, pool: Vec<Node>) -> Self {
        self.node_pool = pool;
        self
    }

    /// True iff a seed pool was supplied
    pub fn node_pool_mode(&self) -> bool {
        !self.node_pool.is_empty()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.operations_limit == 0 {
            return Err(ConfigError::InvalidOperationsLimit(
                "operations limit must be at least 1".into(),
            ));
        }

        if self.interval.is_zero() {
            return Err(ConfigError::InvalidInterval(
                "interval must be positive".into(),
            ));
        }

        if self.root_url.is_empty() {
            return Err(ConfigError::InvalidRootUrl("root url must be set".into()));
        }

        let mut seen = std::collections::BTreeSet::new();
        for node in &self.node_pool {
            if !seen.insert(&node.id) {
                return Err(ConfigError::DuplicatePoolNode(node.id.to_string()));
            }
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid operations limit
    #[error("invalid operations limit: {0}")]
    InvalidOperationsLimit(String),

    /// Invalid tick interval
    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    /// Invalid live-site URL
    #[error("invalid root url: {0}")]
    InvalidRootUrl(String),

    /// The seed pool contains the same node id twice
    #[error("duplicate node id in pool: {0}")]
    DuplicatePoolNode(String),
}
