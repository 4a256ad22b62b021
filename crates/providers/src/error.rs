//! Error types for the provider adapters.

use thiserror::Error;

use weather_common::{PipelineError, Provider};

/// Errors that can occur during a provider call.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Malformed response body: {0}")]
    Decode(String),
}

/// Result type for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    /// Attach provider and station context, mapping onto the pipeline taxonomy.
    pub fn into_pipeline(self, provider: Provider, station: &str) -> PipelineError {
        match self {
            ProviderError::Decode(message) => PipelineError::Decode {
                provider: provider.to_string(),
                station: station.to_string(),
                message,
            },
            other => PipelineError::Request {
                provider: provider.to_string(),
                station: station.to_string(),
                message: other.to_string(),
            },
        }
    }
}
