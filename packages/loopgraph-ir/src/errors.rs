//! Error types for loopgraph-ir
//!
//! Fatal conditions only. Classification that cannot be decided and
//! techniques that are not legal are reported as data, never as errors.

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for loopgraph-ir operations
#[derive(Debug, Error)]
pub enum LoopgraphError {
    /// The IR region handed to the analysis cannot be analyzed
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// An internal invariant could not be re-established (e.g. partition cycles)
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoopgraphError {
    /// Create a malformed-input error
    pub fn malformed(msg: impl Into<String>) -> Self {
        LoopgraphError::MalformedInput(msg.into())
    }

    /// Create an internal invariant error
    pub fn internal(msg: impl Into<String>) -> Self {
        LoopgraphError::InternalInvariant(msg.into())
    }

    /// Whether the error is caused by the caller's input rather than by the analysis
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            LoopgraphError::MalformedInput(_) | LoopgraphError::Config(_)
        )
    }
}

/// Result type alias for loopgraph operations
pub type Result<T> = std::result::Result<T, LoopgraphError>;
