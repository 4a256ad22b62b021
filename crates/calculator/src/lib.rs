//! Derived temperature calculators.
//!
//! The pipeline treats the computation as a black box with one operation:
//! temperature, relative humidity and pressure in, dew point and wet-bulb
//! temperature out. Two implementations are provided:
//!
//! - [`SubprocessCalculator`]: runs an external routine with
//!   `--temperature=.. --humidity=.. --pressure=..` and reads a JSON object
//!   from its standard output
//! - [`NativeCalculator`]: Magnus dew point and a psychrometric wet-bulb
//!   solve, in process

pub mod error;
pub mod native;
pub mod subprocess;

use async_trait::async_trait;

use weather_common::{ThermoInputs, ThermoOutputs};

pub use error::{CalculationError, CalculationResult};
pub use native::NativeCalculator;
pub use subprocess::{SubprocessCalculator, SubprocessConfig};

/// A routine that derives dew point and wet-bulb temperature.
#[async_trait]
pub trait Calculator: Send + Sync {
    /// Label stored with every result, identifying routine and version.
    fn method(&self) -> &str;

    /// Compute the derived temperatures for one set of inputs.
    async fn calculate(&self, inputs: ThermoInputs) -> CalculationResult<ThermoOutputs>;
}

/// Reject inputs no routine can make sense of.
pub(crate) fn validate(inputs: &ThermoInputs) -> CalculationResult<()> {
    let ThermoInputs {
        temperature,
        humidity,
        pressure,
    } = *inputs;

    if !(temperature.is_finite() && humidity.is_finite() && pressure.is_finite()) {
        return Err(CalculationError::InvalidInput(format!(
            "non-finite input: t={} rh={} p={}",
            temperature, humidity, pressure
        )));
    }
    if humidity <= 0.0 || humidity > 100.0 {
        return Err(CalculationError::InvalidInput(format!(
            "relative humidity {} outside (0, 100]",
            humidity
        )));
    }
    if pressure <= 0.0 {
        return Err(CalculationError::InvalidInput(format!(
            "pressure {} must be positive",
            pressure
        )));
    }
    Ok(())
}

/// Reject outputs that are not finite numbers.
pub(crate) fn check_outputs(outputs: ThermoOutputs) -> CalculationResult<ThermoOutputs> {
    if outputs.dew_point.is_finite() && outputs.wet_bulb.is_finite() {
        Ok(outputs)
    } else {
        Err(CalculationError::NonFinite)
    }
}
