//! Correlated reading pairs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::derived::ThermoInputs;
use crate::ids::RunId;

/// A locality reading and a coordinate reading for the same station and run,
/// neither yet processed, with every computation input present.
///
/// Not stored; produced by the unprocessed-pair query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedPair {
    pub locality_reading_id: Uuid,
    pub coordinate_reading_id: Uuid,
    pub station_id: Uuid,
    pub run_id: RunId,
    /// From the locality reading, degrees Celsius
    pub temperature: f64,
    /// From the locality reading, percent
    pub humidity: f64,
    /// From the coordinate reading, hPa
    pub pressure: f64,
}

impl CorrelatedPair {
    pub fn inputs(&self) -> ThermoInputs {
        ThermoInputs {
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
        }
    }

    /// Identifier used in logs and errors.
    pub fn label(&self) -> String {
        format!("{}/{}", self.locality_reading_id, self.coordinate_reading_id)
    }
}
