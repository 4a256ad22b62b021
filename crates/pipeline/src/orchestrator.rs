//! Collect and calculate passes, alone, back to back, or on schedules.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use calculator::Calculator;
use providers::{CoordinateObservation, LocalityObservation, WeatherProvider};
use storage::PipelineStore;
use weather_common::{PipelineResult, RunId};

use crate::calculation::CalculationWorker;
use crate::collector::{PairingPolicy, RunCollector};

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub policy: PairingPolicy,
    /// Cap on concurrently running units per phase; `None` is unbounded
    pub max_concurrency: Option<usize>,
    /// Cap on stations read per run
    pub station_limit: Option<u32>,
    pub collect_interval: Duration,
    pub calculate_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            policy: PairingPolicy::Tolerant,
            max_concurrency: None,
            station_limit: None,
            collect_interval: Duration::from_secs(900),
            calculate_interval: Duration::from_secs(300),
        }
    }
}

/// Summary of one collection pass.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub stations: usize,
    pub locality_readings: usize,
    pub coordinate_readings: usize,
    pub failures: usize,
    pub first_error: Option<String>,
    pub duration_ms: u64,
}

/// Summary of one calculation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CalculationReport {
    pub pairs: usize,
    pub results: usize,
    pub failures: usize,
    pub first_error: Option<String>,
    pub duration_ms: u64,
}

/// Summary of a collect pass followed by a calculate pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub run: RunReport,
    pub calculation: CalculationReport,
}

/// The two-phase pipeline: collect, then calculate.
pub struct Pipeline<L, C> {
    store: Arc<dyn PipelineStore>,
    collector: RunCollector<L, C>,
    worker: CalculationWorker,
    config: PipelineConfig,
}

impl<L, C> Pipeline<L, C>
where
    L: WeatherProvider<Observation = LocalityObservation> + 'static,
    C: WeatherProvider<Observation = CoordinateObservation> + 'static,
{
    pub fn new(
        store: Arc<dyn PipelineStore>,
        locality: Arc<L>,
        coordinate: Arc<C>,
        calculator: Arc<dyn Calculator>,
        config: PipelineConfig,
    ) -> Self {
        let collector =
            RunCollector::new(locality, coordinate, config.policy, config.max_concurrency);
        let worker = CalculationWorker::new(calculator, config.max_concurrency);
        Self {
            store,
            collector,
            worker,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Collection pass: new run, every station, persist whatever succeeded.
    ///
    /// Provider failures are reported, not returned. Only failures that make
    /// the stored state unreliable (identifiers, storage) are errors.
    #[instrument(skip(self))]
    pub async fn collect(&self) -> PipelineResult<RunReport> {
        let started = Instant::now();
        let run_id = RunId::generate()?;
        let stations = self.store.list_stations(self.config.station_limit).await?;
        let station_count = stations.len();

        info!(run_id = %run_id, stations = station_count, "Starting run");

        let outcome = self.collector.collect(run_id, stations).await;
        if let Some(fatal) = outcome.fatal_error {
            error!(run_id = %run_id, error = %fatal, "Run aborted");
            return Err(fatal);
        }

        let readings = outcome.output;
        self.store
            .save_run(run_id, &readings.locality, &readings.coordinate)
            .await?;

        if let Some(err) = &outcome.first_error {
            warn!(
                run_id = %run_id,
                failures = outcome.failures,
                first_error = %err,
                "Run finished with provider failures"
            );
        }

        Ok(RunReport {
            run_id,
            stations: station_count,
            locality_readings: readings.locality.len(),
            coordinate_readings: readings.coordinate.len(),
            failures: outcome.failures,
            first_error: outcome.first_error.map(|e| e.to_string()),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Calculation pass over every unprocessed pair in storage.
    ///
    /// Every selected pair is marked processed afterwards, whether or not its
    /// computation succeeded, so no pair is computed twice.
    #[instrument(skip(self))]
    pub async fn calculate(&self) -> PipelineResult<CalculationReport> {
        let started = Instant::now();
        let pairs = self.store.unprocessed_pairs().await?;
        if pairs.is_empty() {
            debug!("No unprocessed pairs");
            return Ok(CalculationReport::default());
        }

        let outcome = self.worker.compute(pairs.clone()).await;
        if let Some(fatal) = outcome.fatal_error {
            error!(pairs = pairs.len(), error = %fatal, "Calculation aborted");
            return Err(fatal);
        }

        let results = outcome.output;
        self.store.save_results(&results).await?;
        self.store.reconcile_flags(&pairs, &results).await?;

        if let Some(err) = &outcome.first_error {
            warn!(
                failures = outcome.failures,
                first_error = %err,
                "Calculation finished with failures"
            );
        }

        Ok(CalculationReport {
            pairs: pairs.len(),
            results: results.len(),
            failures: outcome.failures,
            first_error: outcome.first_error.map(|e| e.to_string()),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Collect, then calculate.
    pub async fn run_once(&self) -> PipelineResult<PassReport> {
        let run = self.collect().await?;
        let calculation = self.calculate().await?;
        Ok(PassReport { run, calculation })
    }

    /// Run both passes on their own intervals until `shutdown` fires.
    ///
    /// Passes never overlap. A failed pass is logged and the schedule goes
    /// on; the next pass picks up whatever is still unprocessed.
    pub async fn run_forever(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut collect_tick = tokio::time::interval(self.config.collect_interval);
        let mut calculate_tick = tokio::time::interval(self.config.calculate_interval);
        collect_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        calculate_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            collect_secs = self.config.collect_interval.as_secs(),
            calculate_secs = self.config.calculate_interval.as_secs(),
            "Scheduler started"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    info!("Shutting down scheduler");
                    break;
                }
                _ = collect_tick.tick() => {
                    match self.collect().await {
                        Ok(report) => log_run(&report),
                        Err(e) => error!(error = %e, kind = e.kind(), "Scheduled collection failed"),
                    }
                }
                _ = calculate_tick.tick() => {
                    match self.calculate().await {
                        Ok(report) => log_calculation(&report),
                        Err(e) => error!(error = %e, kind = e.kind(), "Scheduled calculation failed"),
                    }
                }
            }
        }
    }
}

/// Log a collection report at info level.
pub fn log_run(report: &RunReport) {
    info!(
        run_id = %report.run_id,
        stations = report.stations,
        locality = report.locality_readings,
        coordinate = report.coordinate_readings,
        failures = report.failures,
        duration_ms = report.duration_ms,
        "Collection pass complete"
    );
}

/// Log a calculation report at info level.
pub fn log_calculation(report: &CalculationReport) {
    info!(
        pairs = report.pairs,
        results = report.results,
        failures = report.failures,
        duration_ms = report.duration_ms,
        "Calculation pass complete"
    );
}
