//! Weather collection service.
//!
//! Samples every monitored station from two weather providers, stores the
//! readings under one run, and computes dew-point and wet-bulb temperatures
//! for the correlated pairs:
//! - `run`: collection and calculation on independent schedules
//! - `once`: one collection pass followed by one calculation pass
//! - `collect` / `calculate`: a single phase
//! - `latest`: print the latest run's results as JSON

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::Settings;
use pipeline::{log_calculation, log_run, Pipeline};
use providers::{CoordinateClient, LocalityClient};
use storage::{PgStore, PipelineStore};

#[derive(Parser, Debug)]
#[command(name = "collector")]
#[command(about = "Weather collection and wet-bulb temperature calculation")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    settings: Settings,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "json")]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Collect and calculate on their own intervals until Ctrl-C
    Run,
    /// One collection pass, then one calculation pass
    Once,
    /// One collection pass
    Collect,
    /// One calculation pass over unprocessed pairs
    Calculate,
    /// Print the latest run's results as JSON
    Latest,
}

impl Command {
    fn calls_providers(self) -> bool {
        matches!(self, Command::Run | Command::Once | Command::Collect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;

    info!(command = ?cli.command, "Starting collector");

    let settings = cli.settings;
    let store = PgStore::connect(&settings.database_url, settings.store_config())
        .await
        .context("Failed to connect to database")?;
    store.migrate().await.context("Failed to apply schema")?;
    let store = Arc::new(store);

    if cli.command == Command::Latest {
        let rows = store
            .latest_results()
            .await
            .context("Failed to read latest results")?;
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let (locality_config, coordinate_config) =
        settings.provider_configs(cli.command.calls_providers())?;
    let locality = LocalityClient::new(locality_config).context("Failed to build locality client")?;
    let coordinate =
        CoordinateClient::new(coordinate_config).context("Failed to build coordinate client")?;

    let pipeline = Pipeline::new(
        store,
        Arc::new(locality),
        Arc::new(coordinate),
        settings.build_calculator(),
        settings.pipeline_config(),
    );

    info!(
        policy = %pipeline.config().policy,
        calculator = ?settings.calculator,
        "Pipeline ready"
    );

    match cli.command {
        Command::Run => {
            // Shutdown signal
            let (shutdown_tx, _) = broadcast::channel::<()>(1);

            // Handle Ctrl+C
            let shutdown_tx_clone = shutdown_tx.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Received shutdown signal");
                shutdown_tx_clone.send(()).ok();
            });

            pipeline.run_forever(shutdown_tx.subscribe()).await;
        }
        Command::Once => {
            let report = pipeline.run_once().await?;
            log_run(&report.run);
            log_calculation(&report.calculation);
        }
        Command::Collect => {
            let report = pipeline.collect().await?;
            log_run(&report);
        }
        Command::Calculate => {
            let report = pipeline.calculate().await?;
            log_calculation(&report);
        }
        Command::Latest => {}
    }

    info!("Collector finished");
    Ok(())
}
