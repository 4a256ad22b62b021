//! PostgreSQL store.

mod catalog;
mod flags;
mod latest;
mod measurements;
mod results;
mod selector;

use std::future::Future;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info, instrument};

use weather_common::{
    CoordinateReading, CorrelatedPair, DerivedResult, LatestResult, LocalityReading,
    PipelineError, PipelineResult, RunId, Station,
};

use crate::schema::SCHEMA_SQL;
use crate::{FlagSets, PipelineStore, StoreConfig};

/// PostgreSQL bind parameter limit per statement.
const BIND_LIMIT: usize = 65535;

/// Rows per multi-row INSERT for a table with `columns` bound columns.
pub(crate) fn rows_per_insert(columns: usize) -> usize {
    (BIND_LIMIT / columns).max(1)
}

/// Pipeline store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    config: StoreConfig,
}

impl PgStore {
    /// Build a pool for `database_url` and check that it answers.
    pub async fn connect(database_url: &str, config: StoreConfig) -> PipelineResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.timeout)
            .connect(database_url)
            .await
            .map_err(|e| PipelineError::persistence("connect", e))?;

        let store = Self { pool, config };
        store.ping().await?;
        Ok(store)
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, config: StoreConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Liveness check under the store deadline.
    pub async fn ping(&self) -> PipelineResult<()> {
        self.with_deadline("ping", async {
            sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ())
        })
        .await
    }

    /// Create tables and indexes that do not exist yet.
    pub async fn migrate(&self) -> PipelineResult<()> {
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                self.with_deadline("migrate", async {
                    sqlx::query(trimmed).execute(&self.pool).await.map(|_| ())
                })
                .await?;
            }
        }

        info!("Schema up to date");
        Ok(())
    }

    /// Insert or update catalog stations, keyed by station id.
    pub async fn upsert_stations(&self, stations: &[Station]) -> PipelineResult<()> {
        self.with_deadline("upsert_stations", catalog::upsert_stations(&self.pool, stations))
            .await
    }

    /// Run a store operation under the configured deadline, mapping both
    /// failure and expiry onto a persistence error.
    async fn with_deadline<T, F>(&self, operation: &'static str, fut: F) -> PipelineResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.config.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(PipelineError::persistence(operation, e)),
            Err(_) => Err(PipelineError::persistence(
                operation,
                format!("timed out after {:?}", self.config.timeout),
            )),
        }
    }
}

#[async_trait]
impl PipelineStore for PgStore {
    async fn list_stations(&self, limit: Option<u32>) -> PipelineResult<Vec<Station>> {
        self.with_deadline("list_stations", catalog::list_stations(&self.pool, limit))
            .await
    }

    #[instrument(skip(self, locality, coordinate), fields(run_id = %run_id))]
    async fn save_run(
        &self,
        run_id: RunId,
        locality: &[LocalityReading],
        coordinate: &[CoordinateReading],
    ) -> PipelineResult<()> {
        self.with_deadline(
            "save_run",
            measurements::save_run(&self.pool, run_id, locality, coordinate),
        )
        .await?;

        debug!(
            locality = locality.len(),
            coordinate = coordinate.len(),
            "Run persisted"
        );
        Ok(())
    }

    async fn unprocessed_pairs(&self) -> PipelineResult<Vec<CorrelatedPair>> {
        self.with_deadline("unprocessed_pairs", selector::unprocessed_pairs(&self.pool))
            .await
    }

    async fn save_results(&self, results: &[DerivedResult]) -> PipelineResult<()> {
        if results.is_empty() {
            return Ok(());
        }
        self.with_deadline("save_results", results::save_results(&self.pool, results))
            .await
    }

    async fn reconcile_flags(
        &self,
        attempted: &[CorrelatedPair],
        succeeded: &[DerivedResult],
    ) -> PipelineResult<()> {
        let sets = FlagSets::new(attempted, succeeded);
        if sets.is_empty() {
            return Ok(());
        }
        self.with_deadline("reconcile_flags", flags::reconcile(&self.pool, &sets))
            .await
    }

    async fn latest_results(&self) -> PipelineResult<Vec<LatestResult>> {
        self.with_deadline("latest_results", latest::latest_results(&self.pool))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_per_insert_respects_bind_limit() {
        assert_eq!(rows_per_insert(14), 4681);
        assert!(rows_per_insert(27) * 27 <= BIND_LIMIT);
        assert_eq!(rows_per_insert(100_000), 1);
    }

    #[test]
    fn test_schema_statements_split_cleanly() {
        let statements: Vec<&str> = SCHEMA_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        assert_eq!(statements.len(), 8);
        assert!(statements.iter().all(|s| s.starts_with("CREATE")));
    }
}
