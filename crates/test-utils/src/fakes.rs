//! Scripted providers and calculators.
//!
//! Each fake looks up what to do for a unit (succeed, fail or panic) in a
//! [`Script`], sleeps for a random latency up to the script's maximum, then
//! acts. Calls are counted so tests can check every unit ran exactly once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use calculator::{CalculationError, CalculationResult, Calculator};
use providers::{
    CoordinateObservation, CurrentConditions, LocalityObservation, LocalityWeatherData,
    ProviderError, ProviderResult, WeatherProvider,
};
use weather_common::{Provider, Station, ThermoInputs, ThermoOutputs};

/// What a scripted unit does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    Fail,
    Panic,
}

/// Per-key outcomes plus a latency ceiling. Unlisted keys succeed.
#[derive(Debug, Default)]
pub struct Script {
    outcomes: HashMap<String, Outcome>,
    max_latency: Duration,
    calls: AtomicUsize,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(mut self, key: impl Into<String>) -> Self {
        self.outcomes.insert(key.into(), Outcome::Fail);
        self
    }

    pub fn panic(mut self, key: impl Into<String>) -> Self {
        self.outcomes.insert(key.into(), Outcome::Panic);
        self
    }

    /// Sleep a uniformly random duration up to `max` before every call.
    pub fn latency(mut self, max: Duration) -> Self {
        self.max_latency = max;
        self
    }

    /// Fail each key independently with probability `fraction`.
    pub fn fail_randomly<I, K>(mut self, keys: I, fraction: f64) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut rng = rand::thread_rng();
        for key in keys {
            if rng.gen_bool(fraction) {
                self.outcomes.insert(key.into(), Outcome::Fail);
            }
        }
        self
    }

    pub fn outcome(&self, key: &str) -> Outcome {
        self.outcomes.get(key).copied().unwrap_or(Outcome::Succeed)
    }

    pub fn failing_keys(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|(_, o)| **o != Outcome::Succeed)
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Count the call, wait out the latency and report the outcome.
    async fn play(&self, key: &str) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let max_ms = self.max_latency.as_millis() as u64;
        if max_ms > 0 {
            let delay = rand::thread_rng().gen_range(0..=max_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let outcome = self.outcome(key);
        if outcome == Outcome::Panic {
            panic!("scripted panic for {}", key);
        }
        outcome
    }
}

/// Locality provider answering from a script keyed by locality id.
pub struct ScriptedLocality {
    pub script: Script,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

impl ScriptedLocality {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            temperature: Some(31.0),
            humidity: Some(62.0),
        }
    }
}

#[async_trait]
impl WeatherProvider for ScriptedLocality {
    type Observation = LocalityObservation;

    fn provider(&self) -> Provider {
        Provider::Locality
    }

    async fn fetch(&self, station: &Station) -> ProviderResult<LocalityObservation> {
        match self.script.play(&station.locality_id).await {
            Outcome::Succeed => Ok(LocalityObservation {
                status: Some("200".to_string()),
                message: Some(String::new()),
                device_type: Some(1),
                locality_weather_data: Some(LocalityWeatherData {
                    temperature: self.temperature,
                    humidity: self.humidity,
                    ..LocalityWeatherData::default()
                }),
            }),
            _ => Err(ProviderError::Status(503)),
        }
    }
}

/// Coordinate provider answering from a script keyed by locality id.
pub struct ScriptedCoordinate {
    pub script: Script,
    pub pressure: Option<f64>,
}

impl ScriptedCoordinate {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            pressure: Some(1008.0),
        }
    }
}

#[async_trait]
impl WeatherProvider for ScriptedCoordinate {
    type Observation = CoordinateObservation;

    fn provider(&self) -> Provider {
        Provider::Coordinate
    }

    async fn fetch(&self, station: &Station) -> ProviderResult<CoordinateObservation> {
        match self.script.play(&station.locality_id).await {
            Outcome::Succeed => Ok(CoordinateObservation {
                lat: Some(station.latitude),
                lon: Some(station.longitude),
                timezone: Some("Asia/Kolkata".to_string()),
                timezone_offset: Some(19800),
                current: Some(CurrentConditions {
                    pressure: self.pressure,
                    ..CurrentConditions::default()
                }),
            }),
            _ => Err(ProviderError::Decode("expected value at line 1 column 1".to_string())),
        }
    }
}

/// Calculator keyed by the temperature input, formatted with `{}`.
///
/// Succeeds with `dew_point = t - 5` and `wet_bulb = t - 3`.
pub struct ScriptedCalculator {
    pub script: Script,
}

impl ScriptedCalculator {
    pub fn new(script: Script) -> Self {
        Self { script }
    }

    pub fn key(inputs: &ThermoInputs) -> String {
        inputs.temperature.to_string()
    }
}

#[async_trait]
impl Calculator for ScriptedCalculator {
    fn method(&self) -> &str {
        "scripted-v1"
    }

    async fn calculate(&self, inputs: ThermoInputs) -> CalculationResult<ThermoOutputs> {
        match self.script.play(&Self::key(&inputs)).await {
            Outcome::Succeed => Ok(ThermoOutputs {
                dew_point: inputs.temperature - 5.0,
                wet_bulb: inputs.temperature - 3.0,
            }),
            _ => Err(CalculationError::ExitStatus {
                status: "exit status: 1".to_string(),
                stderr: "scripted failure".to_string(),
            }),
        }
    }
}
