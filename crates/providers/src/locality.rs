//! Locality weather provider (A).
//!
//! `GET {base}/get_locality_weather_data?locality_id=...` with the API key
//! in a request header. The response is a status/message envelope around an
//! optional `locality_weather_data` object.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use weather_common::{LocalityReading, Provider, RunId, Station};

use crate::{build_client, endpoint, send_json, ProviderConfig, ProviderResult, WeatherProvider};

/// Fixed path of the locality endpoint.
pub const LOCALITY_PATH: &str = "get_locality_weather_data";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-Zomato-Api-Key";

/// Decoded locality response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LocalityObservation {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub device_type: Option<i32>,
    #[serde(default)]
    pub locality_weather_data: Option<LocalityWeatherData>,
}

/// Measured fields of a locality response. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LocalityWeatherData {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_direction: Option<f64>,
    #[serde(default)]
    pub rain_intensity: Option<f64>,
    #[serde(default)]
    pub rain_accumulation: Option<f64>,
}

impl LocalityObservation {
    /// Build the reading to persist for this observation.
    ///
    /// A missing data object leaves every measured column NULL.
    pub fn into_reading(
        self,
        reading_id: Uuid,
        station_id: Uuid,
        run_id: RunId,
    ) -> LocalityReading {
        let data = self.locality_weather_data.unwrap_or_default();

        LocalityReading {
            status: self.status,
            message: self.message,
            device_type: self.device_type,
            temperature: data.temperature,
            humidity: data.humidity,
            wind_speed: data.wind_speed,
            wind_direction: data.wind_direction,
            rain_intensity: data.rain_intensity,
            rain_accumulation: data.rain_accumulation,
            ..LocalityReading::empty(reading_id, station_id, run_id)
        }
    }
}

/// HTTP client for the locality provider.
pub struct LocalityClient {
    client: Client,
    config: ProviderConfig,
}

impl LocalityClient {
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl WeatherProvider for LocalityClient {
    type Observation = LocalityObservation;

    fn provider(&self) -> Provider {
        Provider::Locality
    }

    #[instrument(skip(self, station), fields(locality = %station.locality_id))]
    async fn fetch(&self, station: &Station) -> ProviderResult<LocalityObservation> {
        let url = endpoint(&self.config.base_url, LOCALITY_PATH)?;

        debug!(url = %url, "Requesting locality weather");

        let request = self
            .client
            .get(url)
            .query(&[("locality_id", station.locality_id.as_str())])
            .header(API_KEY_HEADER, &self.config.api_key);

        send_json(request).await
    }
}
