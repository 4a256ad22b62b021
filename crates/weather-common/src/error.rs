//! Error types for the monitoring pipeline.

use thiserror::Error;

/// Result type alias using PipelineError.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Primary error type for pipeline operations.
///
/// Per-unit failures inside a fan-out phase (`Request`, `Decode`,
/// `Computation`, `WorkerFailed`) are logged and skipped. Everything else
/// aborts the pass, see [`PipelineError::is_fatal`].
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    // === Provider Errors ===
    #[error("{provider} request failed for station {station}: {message}")]
    Request {
        provider: String,
        station: String,
        message: String,
    },

    #[error("{provider} response for station {station} could not be decoded: {message}")]
    Decode {
        provider: String,
        station: String,
        message: String,
    },

    // === Calculation Errors ===
    #[error("Computation failed for pair {pair}: {message}")]
    Computation { pair: String, message: String },

    // === Infrastructure Errors ===
    #[error("Persistence failed during {operation}: {message}")]
    Persistence {
        operation: &'static str,
        message: String,
    },

    #[error("Failed to generate identifier: {0}")]
    IdentifierGeneration(String),

    #[error("Worker task failed: {0}")]
    WorkerFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Build a persistence error for the named operation.
    pub fn persistence(operation: &'static str, err: impl std::fmt::Display) -> Self {
        PipelineError::Persistence {
            operation,
            message: err.to_string(),
        }
    }

    /// Whether this error must abort the current pass.
    pub fn is_fatal(&self) -> bool {
        match self {
            PipelineError::Request { .. }
            | PipelineError::Decode { .. }
            | PipelineError::Computation { .. }
            | PipelineError::WorkerFailed(_) => false,

            PipelineError::Persistence { .. }
            | PipelineError::IdentifierGeneration(_)
            | PipelineError::Config(_) => true,
        }
    }

    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Request { .. } => "request",
            PipelineError::Decode { .. } => "decode",
            PipelineError::Computation { .. } => "computation",
            PipelineError::Persistence { .. } => "persistence",
            PipelineError::IdentifierGeneration(_) => "identifier",
            PipelineError::WorkerFailed(_) => "worker",
            PipelineError::Config(_) => "config",
        }
    }
}
