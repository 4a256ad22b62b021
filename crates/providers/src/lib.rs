//! Weather provider adapters.
//!
//! Each adapter turns one [`Station`] into one outbound GET request and
//! decodes the response into a typed observation. Adapters are stateless
//! apart from their HTTP client and never retry; a failed call is reported
//! to the caller as a [`ProviderError`].
//!
//! - [`LocalityClient`]: provider A, keyed by the station's locality id
//! - [`CoordinateClient`]: provider B, keyed by latitude/longitude

pub mod coordinate;
pub mod error;
pub mod locality;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use weather_common::{Provider, Station};

pub use coordinate::{CoordinateClient, CoordinateObservation, CurrentConditions, WeatherCondition};
pub use error::{ProviderError, ProviderResult};
pub use locality::{LocalityClient, LocalityObservation, LocalityWeatherData};

/// Trait for a provider that can observe one station.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Decoded response payload.
    type Observation: Send + 'static;

    /// Which provider this adapter talks to.
    fn provider(&self) -> Provider;

    /// Fetch the current observation for a station.
    async fn fetch(&self, station: &Station) -> ProviderResult<Self::Observation>;
}

/// Connection settings for one provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL; the adapter appends its fixed path
    pub base_url: String,
    pub api_key: String,
    /// Whole-request timeout
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Build the HTTP client shared by all calls of one adapter.
pub(crate) fn build_client(config: &ProviderConfig) -> ProviderResult<Client> {
    Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.timeout.min(Duration::from_secs(5)))
        .build()
        .map_err(|e| ProviderError::Client(e.to_string()))
}

/// Join a base URL and a fixed path, tolerating a trailing slash on the base.
pub(crate) fn endpoint(base_url: &str, path: &str) -> ProviderResult<Url> {
    let joined = format!("{}/{}", base_url.trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", joined, e)))
}

/// Send a prepared request, rejecting non-2xx statuses, and decode its JSON body.
pub(crate) async fn send_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> ProviderResult<T> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status(status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ProviderError::Request(e.to_string()))?;

    serde_json::from_slice(&body).map_err(|e| ProviderError::Decode(e.to_string()))
}
