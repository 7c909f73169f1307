//! Error types for cms-bench-core

use thiserror::Error;

use crate::traits::ValidationError;

/// Core engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A required builder field was not set
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// An operator payload failed required-field validation.
    ///
    /// This aborts the whole run, not just the affected operation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The run was stopped (shutdown or timeout) before reaching done
    #[error("run stopped before completion")]
    Stopped,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::Config(msg.into())
    }

    /// Create a missing-builder-field error
    pub fn missing_field(name: &'static str) -> Self {
        EngineError::MissingField(name)
    }
}

/// Result type alias
pub type EngineResult<T> = std::result::Result<T, EngineError>;
