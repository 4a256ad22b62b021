//! Error types for the calculators.

use std::time::Duration;

use thiserror::Error;

use weather_common::PipelineError;

/// Errors that can occur while computing derived temperatures.
#[derive(Error, Debug)]
pub enum CalculationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to start routine: {0}")]
    Spawn(String),

    #[error("Routine timed out after {0:?}")]
    Timeout(Duration),

    #[error("Routine exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },

    #[error("Unparseable routine output: {0}")]
    Parse(String),

    #[error("Routine produced a non-finite value")]
    NonFinite,
}

/// Result type for calculator operations.
pub type CalculationResult<T> = std::result::Result<T, CalculationError>;

impl CalculationError {
    /// Attach the pair being computed, mapping onto the pipeline taxonomy.
    pub fn into_pipeline(self, pair: String) -> PipelineError {
        PipelineError::Computation {
            pair,
            message: self.to_string(),
        }
    }
}
