//! Provider readings.
//!
//! One reading is one provider's observation of one station within one run.
//! Every measured field is optional: providers omit fields freely (rain
//! gauges report no temperature, humidity or wind) and an absent field is
//! stored as NULL, never as zero.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::RunId;

/// The two independent data providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Locality-keyed provider (A)
    Locality,
    /// Coordinate-keyed provider (B)
    Coordinate,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Locality => "locality",
            Provider::Coordinate => "coordinate",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reading from the locality provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalityReading {
    pub reading_id: Uuid,
    pub station_id: Uuid,
    pub run_id: RunId,
    pub status: Option<String>,
    pub message: Option<String>,
    pub device_type: Option<i32>,
    /// Degrees Celsius
    pub temperature: Option<f64>,
    /// Relative humidity, percent
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub rain_intensity: Option<f64>,
    pub rain_accumulation: Option<f64>,
    pub is_processed: bool,
    pub is_successful: bool,
}

/// Reading from the coordinate provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateReading {
    pub reading_id: Uuid,
    pub station_id: Uuid,
    pub run_id: RunId,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub timezone_offset: Option<i64>,
    /// Observation time, unix seconds
    pub observed_at: Option<i64>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    /// Sea-level pressure, hPa
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub dew_point: Option<f64>,
    pub uv_index: Option<f64>,
    pub clouds: Option<f64>,
    pub visibility: Option<i64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub wind_gust: Option<f64>,
    pub condition_id: Option<i32>,
    pub condition_main: Option<String>,
    pub condition_description: Option<String>,
    pub condition_icon: Option<String>,
    pub is_processed: bool,
    pub is_successful: bool,
}

impl LocalityReading {
    /// A reading with no measured fields, used as a base by builders and tests.
    pub fn empty(reading_id: Uuid, station_id: Uuid, run_id: RunId) -> Self {
        Self {
            reading_id,
            station_id,
            run_id,
            status: None,
            message: None,
            device_type: None,
            temperature: None,
            humidity: None,
            wind_speed: None,
            wind_direction: None,
            rain_intensity: None,
            rain_accumulation: None,
            is_processed: false,
            is_successful: false,
        }
    }
}

impl CoordinateReading {
    /// A reading with no measured fields, used as a base by builders and tests.
    pub fn empty(reading_id: Uuid, station_id: Uuid, run_id: RunId) -> Self {
        Self {
            reading_id,
            station_id,
            run_id,
            latitude: None,
            longitude: None,
            timezone: None,
            timezone_offset: None,
            observed_at: None,
            sunrise: None,
            sunset: None,
            temperature: None,
            feels_like: None,
            pressure: None,
            humidity: None,
            dew_point: None,
            uv_index: None,
            clouds: None,
            visibility: None,
            wind_speed: None,
            wind_direction: None,
            wind_gust: None,
            condition_id: None,
            condition_main: None,
            condition_description: None,
            condition_icon: None,
            is_processed: false,
            is_successful: false,
        }
    }
}
