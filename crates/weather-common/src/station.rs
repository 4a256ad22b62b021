//! Monitored stations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical monitoring location, as stored in the station catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Stable catalog identifier
    pub station_id: Uuid,
    /// Identifier the locality provider knows this station by
    pub locality_id: String,
    pub locality_name: String,
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Provider-reported device type (e.g. "rain_gauge")
    pub device_type: Option<String>,
}

impl Station {
    /// Latitude and longitude formatted for coordinate-based provider queries.
    pub fn coordinate_params(&self) -> (String, String) {
        (self.latitude.to_string(), self.longitude.to_string())
    }
}
