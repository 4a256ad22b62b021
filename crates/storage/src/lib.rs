//! Storage for the monitoring pipeline.
//!
//! Provides one interface, [`PipelineStore`], over:
//! - PostgreSQL ([`PgStore`]) for production
//! - an in-process store ([`MemoryStore`]) with the same observable
//!   semantics, for tests and dry runs

pub mod memory;
pub mod postgres;
mod schema;

use std::time::Duration;

use async_trait::async_trait;

use weather_common::{
    CoordinateReading, CorrelatedPair, DerivedResult, LatestResult, LocalityReading,
    PipelineResult, RunId, Station,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Connection and deadline settings for a store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// Deadline applied to every store operation
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Everything the pipeline reads from and writes to storage.
///
/// Every failure is a [`weather_common::PipelineError::Persistence`] and is
/// fatal to the pass that hit it.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    /// Monitored stations, optionally capped at `limit`.
    async fn list_stations(&self, limit: Option<u32>) -> PipelineResult<Vec<Station>>;

    /// Record the run and bulk-insert its readings, atomically.
    /// Empty reading lists are valid.
    async fn save_run(
        &self,
        run_id: RunId,
        locality: &[LocalityReading],
        coordinate: &[CoordinateReading],
    ) -> PipelineResult<()>;

    /// Reading pairs sharing station and run, neither side processed, with
    /// temperature, humidity and pressure all present. Order is unspecified.
    async fn unprocessed_pairs(&self) -> PipelineResult<Vec<CorrelatedPair>>;

    /// Bulk-insert derived results. An empty list is a no-op. A pair that
    /// already has a result keeps its existing one, so a pass interrupted
    /// between saving results and reconciling flags can be repeated.
    async fn save_results(&self, results: &[DerivedResult]) -> PipelineResult<()>;

    /// Mark every attempted pair processed and every succeeded pair
    /// successful, as one batch. An attempted pair that already has a stored
    /// result is also marked successful. Applying the same sets twice is a
    /// no-op.
    async fn reconcile_flags(
        &self,
        attempted: &[CorrelatedPair],
        succeeded: &[DerivedResult],
    ) -> PipelineResult<()>;

    /// Results of the most recent run that has any, hottest wet bulb first,
    /// values rounded to three decimals.
    async fn latest_results(&self) -> PipelineResult<Vec<LatestResult>>;
}

/// Identifier sets touched by a flag reconciliation, split per table.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct FlagSets {
    pub processed_locality: Vec<uuid::Uuid>,
    pub processed_coordinate: Vec<uuid::Uuid>,
    pub successful_locality: Vec<uuid::Uuid>,
    pub successful_coordinate: Vec<uuid::Uuid>,
}

impl FlagSets {
    pub fn new(attempted: &[CorrelatedPair], succeeded: &[DerivedResult]) -> Self {
        Self {
            processed_locality: attempted.iter().map(|p| p.locality_reading_id).collect(),
            processed_coordinate: attempted.iter().map(|p| p.coordinate_reading_id).collect(),
            successful_locality: succeeded.iter().map(|r| r.locality_reading_id).collect(),
            successful_coordinate: succeeded.iter().map(|r| r.coordinate_reading_id).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.processed_locality.is_empty()
            && self.processed_coordinate.is_empty()
            && self.successful_locality.is_empty()
            && self.successful_coordinate.is_empty()
    }
}

/// Round to three decimals, as the latest-results feed reports values.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_flag_sets_split_per_table() {
        let pair = CorrelatedPair {
            locality_reading_id: Uuid::new_v4(),
            coordinate_reading_id: Uuid::new_v4(),
            station_id: Uuid::new_v4(),
            run_id: RunId(Uuid::new_v4()),
            temperature: 30.0,
            humidity: 60.0,
            pressure: 1005.0,
        };
        let sets = FlagSets::new(std::slice::from_ref(&pair), &[]);

        assert_eq!(sets.processed_locality, vec![pair.locality_reading_id]);
        assert_eq!(sets.processed_coordinate, vec![pair.coordinate_reading_id]);
        assert!(sets.successful_locality.is_empty());
        assert!(!sets.is_empty());
        assert!(FlagSets::new(&[], &[]).is_empty());
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(25.56349), 25.563);
        assert_eq!(round3(-6.8004), -6.8);
        assert_eq!(round3(20.0), 20.0);
    }
}
