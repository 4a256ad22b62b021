//! Service configuration from command-line arguments and environment.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};

use calculator::{Calculator, NativeCalculator, SubprocessCalculator, SubprocessConfig};
use pipeline::{PairingPolicy, PipelineConfig};
use providers::ProviderConfig;
use storage::StoreConfig;

/// Which calculator computes the derived temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CalculatorKind {
    /// External routine run as a child process
    Subprocess,
    /// In-process psychrometric solver
    Native,
}

/// Connection, provider, calculator and scheduling settings.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Locality provider base URL
    #[arg(long, env = "LOCALITY_API_BASE_URL", default_value = "")]
    pub locality_api_base_url: String,

    /// Locality provider API key
    #[arg(long, env = "LOCALITY_API_KEY", default_value = "", hide_env_values = true)]
    pub locality_api_key: String,

    /// Coordinate provider base URL
    #[arg(long, env = "COORDINATE_API_BASE_URL", default_value = "")]
    pub coordinate_api_base_url: String,

    /// Coordinate provider API key
    #[arg(long, env = "COORDINATE_API_KEY", default_value = "", hide_env_values = true)]
    pub coordinate_api_key: String,

    /// Calculator implementation
    #[arg(long, env = "CALCULATOR", value_enum, default_value = "subprocess")]
    pub calculator: CalculatorKind,

    /// Program run by the subprocess calculator (e.g. a virtualenv's python)
    #[arg(long, env = "CALCULATOR_PROGRAM", default_value = "python3")]
    pub calculator_program: PathBuf,

    /// Script passed to the program before the input flags; empty when the
    /// program is the routine itself
    #[arg(long, env = "CALCULATOR_SCRIPT", default_value = "scripts/wet_bulb_temperature.py")]
    pub calculator_script: String,

    /// Override the method label stored with subprocess results
    #[arg(long, env = "CALCULATOR_METHOD")]
    pub calculator_method: Option<String>,

    /// Pairing policy when only one provider answers: tolerant or strict
    #[arg(long, env = "PAIRING_POLICY", default_value = "tolerant")]
    pub pairing_policy: PairingPolicy,

    /// Maximum concurrently running units per phase (0 = unbounded)
    #[arg(long, env = "MAX_CONCURRENCY", default_value = "0")]
    pub max_concurrency: usize,

    /// Maximum stations read per run
    #[arg(long, env = "STATION_LIMIT")]
    pub station_limit: Option<u32>,

    /// Provider request timeout in seconds
    #[arg(long, env = "PROVIDER_TIMEOUT_SECS", default_value = "10")]
    pub provider_timeout_secs: u64,

    /// Calculator routine timeout in seconds
    #[arg(long, env = "CALCULATOR_TIMEOUT_SECS", default_value = "30")]
    pub calculator_timeout_secs: u64,

    /// Deadline for each database operation in seconds
    #[arg(long, env = "DB_TIMEOUT_SECS", default_value = "5")]
    pub db_timeout_secs: u64,

    /// Maximum pooled database connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value = "10")]
    pub db_max_connections: u32,

    /// Seconds between collection passes in `run` mode
    #[arg(long, env = "COLLECT_INTERVAL_SECS", default_value = "900")]
    pub collect_interval_secs: u64,

    /// Seconds between calculation passes in `run` mode
    #[arg(long, env = "CALCULATE_INTERVAL_SECS", default_value = "300")]
    pub calculate_interval_secs: u64,
}

impl Settings {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_connections: self.db_max_connections,
            timeout: Duration::from_secs(self.db_timeout_secs),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            policy: self.pairing_policy,
            max_concurrency: (self.max_concurrency > 0).then_some(self.max_concurrency),
            station_limit: self.station_limit,
            collect_interval: Duration::from_secs(self.collect_interval_secs),
            calculate_interval: Duration::from_secs(self.calculate_interval_secs),
        }
    }

    /// Provider settings (locality, coordinate).
    ///
    /// With `required` set, missing URLs or keys are an error; passes that
    /// never call the providers can run without them.
    pub fn provider_configs(&self, required: bool) -> Result<(ProviderConfig, ProviderConfig)> {
        if required {
            let missing: Vec<&str> = [
                ("LOCALITY_API_BASE_URL", &self.locality_api_base_url),
                ("LOCALITY_API_KEY", &self.locality_api_key),
                ("COORDINATE_API_BASE_URL", &self.coordinate_api_base_url),
                ("COORDINATE_API_KEY", &self.coordinate_api_key),
            ]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();

            if !missing.is_empty() {
                bail!("missing provider settings: {}", missing.join(", "));
            }
        }

        let timeout = Duration::from_secs(self.provider_timeout_secs);
        Ok((
            ProviderConfig {
                base_url: self.locality_api_base_url.clone(),
                api_key: self.locality_api_key.clone(),
                timeout,
            },
            ProviderConfig {
                base_url: self.coordinate_api_base_url.clone(),
                api_key: self.coordinate_api_key.clone(),
                timeout,
            },
        ))
    }

    pub fn subprocess_config(&self) -> SubprocessConfig {
        let defaults = SubprocessConfig::default();
        SubprocessConfig {
            program: self.calculator_program.clone(),
            leading_args: Some(self.calculator_script.trim())
                .filter(|script| !script.is_empty())
                .map(str::to_string)
                .into_iter()
                .collect(),
            timeout: Duration::from_secs(self.calculator_timeout_secs),
            method: self.calculator_method.clone().unwrap_or(defaults.method),
        }
    }

    pub fn build_calculator(&self) -> Arc<dyn Calculator> {
        match self.calculator {
            CalculatorKind::Subprocess => {
                Arc::new(SubprocessCalculator::new(self.subprocess_config()))
            }
            CalculatorKind::Native => Arc::new(NativeCalculator::new()),
        }
    }
}
