//! External routine invoked as a child process.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument};

use weather_common::{ThermoInputs, ThermoOutputs};

use crate::{check_outputs, validate, CalculationError, CalculationResult, Calculator};

/// Settings for the external routine.
#[derive(Debug, Clone)]
pub struct SubprocessConfig {
    /// Executable to run (e.g. an interpreter inside a virtualenv)
    pub program: PathBuf,
    /// Arguments placed before the input flags (e.g. the script path)
    pub leading_args: Vec<String>,
    /// Kill the routine if it runs longer than this
    pub timeout: Duration,
    /// Label stored with every result
    pub method: String,
}

impl Default for SubprocessConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("python3"),
            leading_args: vec!["scripts/wet_bulb_temperature.py".to_string()],
            timeout: Duration::from_secs(30),
            method: "metpy-subprocess-v1".to_string(),
        }
    }
}

/// JSON object printed by the routine. Both key spellings are accepted.
#[derive(Debug, Deserialize)]
struct RoutineOutput {
    #[serde(alias = "temperature_dew_point")]
    dew_point_temperature: f64,
    #[serde(alias = "temperature_wet_bulb")]
    wet_bulb_temperature: f64,
}

/// Calculator that shells out to an external routine.
pub struct SubprocessCalculator {
    config: SubprocessConfig,
}

impl SubprocessCalculator {
    pub fn new(config: SubprocessConfig) -> Self {
        Self { config }
    }

    /// Command-line flags for one invocation.
    pub fn input_args(inputs: &ThermoInputs) -> [String; 3] {
        [
            format!("--temperature={}", inputs.temperature),
            format!("--humidity={}", inputs.humidity),
            format!("--pressure={}", inputs.pressure),
        ]
    }
}

/// Parse the routine's standard output.
pub fn parse_output(stdout: &[u8]) -> CalculationResult<ThermoOutputs> {
    let output: RoutineOutput =
        serde_json::from_slice(stdout).map_err(|e| CalculationError::Parse(e.to_string()))?;

    check_outputs(ThermoOutputs {
        dew_point: output.dew_point_temperature,
        wet_bulb: output.wet_bulb_temperature,
    })
}

#[async_trait]
impl Calculator for SubprocessCalculator {
    fn method(&self) -> &str {
        &self.config.method
    }

    #[instrument(skip(self), fields(program = %self.config.program.display()))]
    async fn calculate(&self, inputs: ThermoInputs) -> CalculationResult<ThermoOutputs> {
        validate(&inputs)?;

        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.leading_args)
            .args(Self::input_args(&inputs))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| CalculationError::Spawn(e.to_string()))?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| CalculationError::Timeout(self.config.timeout))?
            .map_err(|e| CalculationError::Spawn(e.to_string()))?;

        if !output.status.success() {
            return Err(CalculationError::ExitStatus {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(bytes = output.stdout.len(), "Routine finished");
        parse_output(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_args_format() {
        let args = SubprocessCalculator::input_args(&ThermoInputs {
            temperature: 27.5,
            humidity: 80.0,
            pressure: 1004.25,
        });
        assert_eq!(
            args,
            [
                "--temperature=27.5".to_string(),
                "--humidity=80".to_string(),
                "--pressure=1004.25".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_output_accepts_both_spellings() {
        let a = parse_output(br#"{"dew_point_temperature": 21.3, "wet_bulb_temperature": 23.9}"#)
            .unwrap();
        let b = parse_output(br#"{"temperature_dew_point": 21.3, "temperature_wet_bulb": 23.9}"#)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.wet_bulb, 23.9);
    }

    #[test]
    fn test_parse_output_rejects_malformed() {
        assert!(matches!(
            parse_output(b"Traceback (most recent call last)"),
            Err(CalculationError::Parse(_))
        ));
        assert!(matches!(
            parse_output(br#"{"dew_point_temperature": 21.3}"#),
            Err(CalculationError::Parse(_))
        ));
    }
}
