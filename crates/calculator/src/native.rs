//! In-process calculator.
//!
//! Dew point uses the Magnus form with the Alduchov-Eskridge coefficients.
//! Wet bulb solves the psychrometric equation
//!
//! ```text
//! e = es(Tw) - A(Tw) * p * (T - Tw),   A(Tw) = 6.6e-4 * (1 + 0.00115 * Tw)
//! ```
//!
//! for `Tw` by bisection between the dew point and the air temperature,
//! where the residual changes sign.

use async_trait::async_trait;

use weather_common::{ThermoInputs, ThermoOutputs};

use crate::{check_outputs, validate, CalculationResult, Calculator};

const MAGNUS_A: f64 = 17.625;
const MAGNUS_B: f64 = 243.04;
const MAGNUS_C: f64 = 6.1094;

const BISECTION_STEPS: usize = 64;
const TOLERANCE: f64 = 1e-6;

/// Saturation vapour pressure over water, hPa.
pub fn saturation_vapor_pressure(temperature: f64) -> f64 {
    MAGNUS_C * (MAGNUS_A * temperature / (MAGNUS_B + temperature)).exp()
}

/// Dew point, degrees Celsius.
pub fn dew_point(temperature: f64, humidity: f64) -> f64 {
    let gamma = (humidity / 100.0).ln() + MAGNUS_A * temperature / (MAGNUS_B + temperature);
    MAGNUS_B * gamma / (MAGNUS_A - gamma)
}

/// Wet-bulb temperature, degrees Celsius.
pub fn wet_bulb(temperature: f64, humidity: f64, pressure: f64) -> f64 {
    let vapor_pressure = humidity / 100.0 * saturation_vapor_pressure(temperature);
    let residual = |tw: f64| {
        let psychrometric = 6.6e-4 * (1.0 + 0.00115 * tw);
        saturation_vapor_pressure(tw)
            - psychrometric * pressure * (temperature - tw)
            - vapor_pressure
    };

    let mut low = dew_point(temperature, humidity).min(temperature);
    let mut high = temperature;

    for _ in 0..BISECTION_STEPS {
        if high - low < TOLERANCE {
            break;
        }
        let mid = (low + high) / 2.0;
        if residual(mid) > 0.0 {
            high = mid;
        } else {
            low = mid;
        }
    }

    (low + high) / 2.0
}

/// Calculator running entirely in process.
#[derive(Debug, Clone)]
pub struct NativeCalculator {
    method: String,
}

impl NativeCalculator {
    pub fn new() -> Self {
        Self {
            method: "native-psychrometric-v1".to_string(),
        }
    }
}

impl Default for NativeCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Calculator for NativeCalculator {
    fn method(&self) -> &str {
        &self.method
    }

    async fn calculate(&self, inputs: ThermoInputs) -> CalculationResult<ThermoOutputs> {
        validate(&inputs)?;

        check_outputs(ThermoOutputs {
            dew_point: dew_point(inputs.temperature, inputs.humidity),
            wet_bulb: wet_bulb(inputs.temperature, inputs.humidity, inputs.pressure),
        })
    }
}
