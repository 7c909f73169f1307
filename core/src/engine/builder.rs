//! Builder pattern for engine construction

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use crate::channel::ChannelConfig;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::node::Node;
use crate::traits::{ContentCheck, Operator};

use super::scheduler::{Engine, TransitionHook};

/// Builder for creating an [`Engine`] with proper configuration
///
/// # Example
///
/// ```ignore
/// let engine = EngineBuilder::new()
///     .operations_limit(10)
///     .interval(Duration::from_secs(1))
///     .root_url("http://localhost:4503")
///     .operators(operators)
///     .checker(checker)
///     .build()?;
///
/// let stats = engine.run().await?;
/// ```
pub struct EngineBuilder {
    config: EngineConfig,
    operators: Option<Arc<dyn Operator>>,
    checker: Option<Arc<dyn ContentCheck>>,
    channel_config: ChannelConfig,
    on_transition: Option<TransitionHook>,
}

impl EngineBuilder {
    /// Create a new engine builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            operators: None,
            checker: None,
            channel_config: ChannelConfig::default(),
            on_transition: None,
        }
    }

    /// Set the full engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the tick period
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Set the total operation budget
    pub fn operations_limit(mut self, limit: usize) -> Self {
        self.config.operations_limit = limit;
        self
    }

    /// Set the live-site base URL
    pub fn root_url(mut self, root_url: impl Into<String>) -> Self {
        self.config.root_url = root_url.into();
        self
    }

    /// Set the seed node pool (switches the engine into pool mode)
    pub fn node_pool(mut self, pool: Vec<Node>) -> Self {
        self.config.node_pool = pool;
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

    /// Set the channel configuration
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Set the transition callback, invoked synchronously on every scheduler
    /// state transition with the current snapshot
    pub fn on_transition(mut self, hook: TransitionHook) -> Self {
        self.on_transition = Some(hook);
        self
    }

    /// Build the engine
    ///
    /// # Errors
    ///
    /// Returns an error if operators or checker are not set, or if the
    /// configuration fails validation.
    pub fn build(self) -> EngineResult<Engine> {
        let operators = self
            .operators
            .ok_or(EngineError::missing_field("operators"))?;

        let checker = self.checker.ok_or(EngineError::missing_field("checker"))?;

        self.config
            .validate()
            .map_err(|e| EngineError::config(e.to_string()))?;

        let (events_tx, events_rx) = mpsc::channel(self.channel_config.events_buffer);
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Engine::new(
            self.config,
            operators,
            checker,
            events_tx,
            events_rx,
            shutdown_tx,
            self.on_transition,
        ))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
