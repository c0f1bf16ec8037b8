//! Engine-specific error types.

use thiserror::Error;

use crate::worker::WorkerError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by an engine adapter.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine refused the query (bad MDX, unknown member, ...).
    #[error("engine rejected query: {message}")]
    Rejected { message: String },

    /// Transport failure talking to an engine bridge.
    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// The in-memory catalog could not be loaded.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// The engine does not implement this operation.
    #[error("operation not supported by this engine: {0}")]
    Unsupported(String),
}

impl EngineError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Whether the engine answered but said no, as opposed to failing to answer.
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::Rejected { .. } => true,
            Self::Worker(WorkerError::Remote { .. } | WorkerError::InvalidRequest(_)) => true,
            _ => false,
        }
    }
}
