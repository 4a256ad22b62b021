//! Common types and utilities shared across the wet-bulb monitoring crates.

pub mod derived;
pub mod error;
pub mod ids;
pub mod pair;
pub mod reading;
pub mod station;

pub use derived::{DerivedResult, LatestResult, ThermoInputs, ThermoOutputs};
pub use error::{PipelineError, PipelineResult};
pub use ids::{generate_id, RunId};
pub use pair::CorrelatedPair;
pub use reading::{CoordinateReading, LocalityReading, Provider};
pub use station::Station;
