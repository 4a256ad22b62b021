//! Derived temperature results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::RunId;
use crate::pair::CorrelatedPair;

/// Inputs of the derived-temperature computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermoInputs {
    /// Air temperature, degrees Celsius
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    /// Pressure, hPa
    pub pressure: f64,
}

/// Outputs of the derived-temperature computation, degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermoOutputs {
    pub dew_point: f64,
    pub wet_bulb: f64,
}

/// One computed output for one successfully processed pair. Immutable once saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedResult {
    pub result_id: Uuid,
    pub locality_reading_id: Uuid,
    pub coordinate_reading_id: Uuid,
    /// Label of the routine (and version) that produced the values
    pub method: String,
    pub dew_point: f64,
    pub wet_bulb: f64,
}

impl DerivedResult {
    pub fn from_pair(
        result_id: Uuid,
        pair: &CorrelatedPair,
        method: impl Into<String>,
        outputs: ThermoOutputs,
    ) -> Self {
        Self {
            result_id,
            locality_reading_id: pair.locality_reading_id,
            coordinate_reading_id: pair.coordinate_reading_id,
            method: method.into(),
            dew_point: outputs.dew_point,
            wet_bulb: outputs.wet_bulb,
        }
    }
}

/// A derived result of the most recent run, joined with its station details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestResult {
    pub run_id: RunId,
    pub locality_id: String,
    pub locality_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub dew_point: f64,
    pub wet_bulb: f64,
    pub computed_at: DateTime<Utc>,
}
