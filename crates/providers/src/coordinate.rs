//! Coordinate weather provider (B).
//!
//! `GET {base}/onecall?lat=..&lon=..&exclude=minutely,hourly,daily,alerts&appid=..`.
//! Only the `current` block and the first entry of its `weather` list are
//! kept.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use weather_common::{CoordinateReading, Provider, RunId, Station};

use crate::{build_client, endpoint, send_json, ProviderConfig, ProviderResult, WeatherProvider};

/// Fixed path of the one-call endpoint.
pub const ONECALL_PATH: &str = "onecall";

/// Blocks excluded from the response; only current conditions are needed.
pub const EXCLUDE_BLOCKS: &str = "minutely,hourly,daily,alerts";

/// Decoded one-call response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoordinateObservation {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub timezone_offset: Option<i64>,
    #[serde(default)]
    pub current: Option<CurrentConditions>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub dt: Option<i64>,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub dew_point: Option<f64>,
    #[serde(default)]
    pub uvi: Option<f64>,
    #[serde(default)]
    pub clouds: Option<f64>,
    #[serde(default)]
    pub visibility: Option<i64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_deg: Option<f64>,
    #[serde(default)]
    pub wind_gust: Option<f64>,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WeatherCondition {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl CoordinateObservation {
    /// Build the reading to persist for this observation.
    ///
    /// A missing `current` block or an empty condition list leaves the
    /// corresponding columns NULL.
    pub fn into_reading(
        self,
        reading_id: Uuid,
        station_id: Uuid,
        run_id: RunId,
    ) -> CoordinateReading {
        let current = self.current.unwrap_or_default();
        let condition = current.weather.into_iter().next().unwrap_or_default();

        CoordinateReading {
            latitude: self.lat,
            longitude: self.lon,
            timezone: self.timezone,
            timezone_offset: self.timezone_offset,
            observed_at: current.dt,
            sunrise: current.sunrise,
            sunset: current.sunset,
            temperature: current.temp,
            feels_like: current.feels_like,
            pressure: current.pressure,
            humidity: current.humidity,
            dew_point: current.dew_point,
            uv_index: current.uvi,
            clouds: current.clouds,
            visibility: current.visibility,
            wind_speed: current.wind_speed,
            wind_direction: current.wind_deg,
            wind_gust: current.wind_gust,
            condition_id: condition.id,
            condition_main: condition.main,
            condition_description: condition.description,
            condition_icon: condition.icon,
            ..CoordinateReading::empty(reading_id, station_id, run_id)
        }
    }
}

/// HTTP client for the coordinate provider.
pub struct CoordinateClient {
    client: Client,
    config: ProviderConfig,
}

impl CoordinateClient {
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl WeatherProvider for CoordinateClient {
    type Observation = CoordinateObservation;

    fn provider(&self) -> Provider {
        Provider::Coordinate
    }

    #[instrument(skip(self, station), fields(locality = %station.locality_id))]
    async fn fetch(&self, station: &Station) -> ProviderResult<CoordinateObservation> {
        let url = endpoint(&self.config.base_url, ONECALL_PATH)?;
        let (lat, lon) = station.coordinate_params();

        debug!(url = %url, lat = %lat, lon = %lon, "Requesting coordinate weather");

        let request = self.client.get(url).query(&[
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("exclude", EXCLUDE_BLOCKS),
            ("appid", self.config.api_key.as_str()),
        ]);

        send_json(request).await
    }
}
