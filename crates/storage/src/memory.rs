//! In-process store.
//!
//! Mirrors the PostgreSQL constraints the pipeline relies on (primary keys,
//! one reading per station per run and provider, references to existing
//! stations and readings, successful implies processed) so tests against it
//! observe the same behaviour. Every write validates first and applies only
//! when the whole batch is acceptable.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use weather_common::{
    CoordinateReading, CorrelatedPair, DerivedResult, LatestResult, LocalityReading,
    PipelineError, PipelineResult, RunId, Station,
};

use crate::{round3, FlagSets, PipelineStore};

#[derive(Debug, Clone)]
struct StoredResult {
    result: DerivedResult,
    computed_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    stations: Vec<Station>,
    /// Insertion order doubles as start order.
    runs: Vec<(RunId, DateTime<Utc>)>,
    locality: HashMap<Uuid, LocalityReading>,
    coordinate: HashMap<Uuid, CoordinateReading>,
    results: Vec<StoredResult>,
    failing: HashSet<&'static str>,
}

/// Report a constraint violation the way the database would.
fn violation(operation: &'static str, message: String) -> PipelineError {
    PipelineError::persistence(operation, format!("constraint violation: {}", message))
}

/// Validate one reading batch of a run: right run, known station, fresh and
/// unique reading ids, at most one reading per station.
fn check_readings(
    state: &State,
    run_id: RunId,
    exists: impl Fn(&Uuid) -> bool,
    rows: impl Iterator<Item = (Uuid, Uuid, RunId)>,
) -> PipelineResult<()> {
    const OP: &str = "save_run";
    let mut ids = HashSet::new();
    let mut stations = HashSet::new();

    for (reading_id, station_id, reading_run) in rows {
        if reading_run != run_id {
            return Err(violation(OP, format!("{} belongs to run {}", reading_id, reading_run)));
        }
        if !state.has_station(station_id) {
            return Err(violation(OP, format!("unknown station {}", station_id)));
        }
        if exists(&reading_id) || !ids.insert(reading_id) {
            return Err(violation(OP, format!("duplicate reading {}", reading_id)));
        }
        if !stations.insert(station_id) {
            return Err(violation(OP, format!("two readings for station {}", station_id)));
        }
    }
    Ok(())
}

impl State {
    fn check_failure(&self, operation: &'static str) -> PipelineResult<()> {
        if self.failing.contains(operation) {
            return Err(PipelineError::persistence(operation, "injected failure"));
        }
        Ok(())
    }

    fn has_station(&self, station_id: Uuid) -> bool {
        self.stations.iter().any(|s| s.station_id == station_id)
    }
}

/// Store holding everything in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose catalog holds `stations`.
    pub fn with_stations(stations: Vec<Station>) -> Self {
        Self {
            state: Mutex::new(State {
                stations,
                ..State::default()
            }),
        }
    }

    /// Make every later call of the named trait operation fail.
    pub async fn fail_on(&self, operation: &'static str) {
        self.state.lock().await.failing.insert(operation);
    }

    /// Undo [`MemoryStore::fail_on`].
    pub async fn recover(&self, operation: &'static str) {
        self.state.lock().await.failing.remove(operation);
    }

    pub async fn run_ids(&self) -> Vec<RunId> {
        self.state.lock().await.runs.iter().map(|(id, _)| *id).collect()
    }

    pub async fn locality_readings(&self) -> Vec<LocalityReading> {
        self.state.lock().await.locality.values().cloned().collect()
    }

    pub async fn coordinate_readings(&self) -> Vec<CoordinateReading> {
        self.state.lock().await.coordinate.values().cloned().collect()
    }

    pub async fn results(&self) -> Vec<DerivedResult> {
        self.state
            .lock()
            .await
            .results
            .iter()
            .map(|r| r.result.clone())
            .collect()
    }
}

#[async_trait]
impl PipelineStore for MemoryStore {
    async fn list_stations(&self, limit: Option<u32>) -> PipelineResult<Vec<Station>> {
        let state = self.state.lock().await;
        state.check_failure("list_stations")?;

        let mut stations = state.stations.clone();
        stations.sort_by(|a, b| {
            (a.city_name.as_str(), a.locality_name.as_str())
                .cmp(&(b.city_name.as_str(), b.locality_name.as_str()))
        });
        if let Some(limit) = limit {
            stations.truncate(limit as usize);
        }
        Ok(stations)
    }

    async fn save_run(
        &self,
        run_id: RunId,
        locality: &[LocalityReading],
        coordinate: &[CoordinateReading],
    ) -> PipelineResult<()> {
        const OP: &str = "save_run";
        let mut state = self.state.lock().await;
        state.check_failure(OP)?;

        if state.runs.iter().any(|(id, _)| *id == run_id) {
            return Err(violation(OP, format!("duplicate run {}", run_id)));
        }

        check_readings(
            &state,
            run_id,
            |id| state.locality.contains_key(id),
            locality.iter().map(|r| (r.reading_id, r.station_id, r.run_id)),
        )?;
        check_readings(
            &state,
            run_id,
            |id| state.coordinate.contains_key(id),
            coordinate.iter().map(|r| (r.reading_id, r.station_id, r.run_id)),
        )?;

        state.runs.push((run_id, Utc::now()));
        for r in locality {
            state.locality.insert(r.reading_id, r.clone());
        }
        for r in coordinate {
            state.coordinate.insert(r.reading_id, r.clone());
        }
        Ok(())
    }

    async fn unprocessed_pairs(&self) -> PipelineResult<Vec<CorrelatedPair>> {
        let state = self.state.lock().await;
        state.check_failure("unprocessed_pairs")?;

        let mut pairs = Vec::new();
        for a in state.locality.values().filter(|a| !a.is_processed) {
            let (Some(temperature), Some(humidity)) = (a.temperature, a.humidity) else {
                continue;
            };
            let partner = state.coordinate.values().find(|b| {
                b.station_id == a.station_id && b.run_id == a.run_id && !b.is_processed
            });
            if let Some(b) = partner {
                if let Some(pressure) = b.pressure {
                    pairs.push(CorrelatedPair {
                        locality_reading_id: a.reading_id,
                        coordinate_reading_id: b.reading_id,
                        station_id: a.station_id,
                        run_id: a.run_id,
                        temperature,
                        humidity,
                        pressure,
                    });
                }
            }
        }
        Ok(pairs)
    }

    async fn save_results(&self, results: &[DerivedResult]) -> PipelineResult<()> {
        const OP: &str = "save_results";
        let mut state = self.state.lock().await;
        state.check_failure(OP)?;

        let mut ids = HashSet::new();
        let mut pairs: HashSet<(Uuid, Uuid)> = state
            .results
            .iter()
            .map(|s| (s.result.locality_reading_id, s.result.coordinate_reading_id))
            .collect();
        let mut fresh = Vec::new();
        for r in results {
            if !state.locality.contains_key(&r.locality_reading_id)
                || !state.coordinate.contains_key(&r.coordinate_reading_id)
            {
                return Err(violation(OP, format!("unknown readings in {}", r.result_id)));
            }
            let taken = state.results.iter().any(|s| s.result.result_id == r.result_id);
            if taken || !ids.insert(r.result_id) {
                return Err(violation(OP, format!("duplicate result {}", r.result_id)));
            }
            // A pair that already has a result keeps it.
            if pairs.insert((r.locality_reading_id, r.coordinate_reading_id)) {
                fresh.push(r);
            }
        }

        let computed_at = Utc::now();
        state.results.extend(fresh.into_iter().map(|r| StoredResult {
            result: r.clone(),
            computed_at,
        }));
        Ok(())
    }

    async fn reconcile_flags(
        &self,
        attempted: &[CorrelatedPair],
        succeeded: &[DerivedResult],
    ) -> PipelineResult<()> {
        const OP: &str = "reconcile_flags";
        let mut state = self.state.lock().await;
        state.check_failure(OP)?;

        let mut sets = FlagSets::new(attempted, succeeded);

        // Attempted pairs that already hold a result from an earlier pass.
        let attempted_pairs: HashSet<(Uuid, Uuid)> = attempted
            .iter()
            .map(|p| (p.locality_reading_id, p.coordinate_reading_id))
            .collect();
        for stored in &state.results {
            let key = (
                stored.result.locality_reading_id,
                stored.result.coordinate_reading_id,
            );
            if attempted_pairs.contains(&key) {
                sets.successful_locality.push(key.0);
                sets.successful_coordinate.push(key.1);
            }
        }

        // A successful flag on a reading that stays unprocessed would break
        // the successful-implies-processed constraint: reject the batch.
        let processed_locality: HashSet<Uuid> = sets.processed_locality.iter().copied().collect();
        let processed_coordinate: HashSet<Uuid> =
            sets.processed_coordinate.iter().copied().collect();
        for id in &sets.successful_locality {
            if let Some(r) = state.locality.get(id) {
                if !r.is_processed && !processed_locality.contains(id) {
                    return Err(violation(OP, format!("{} successful but unprocessed", id)));
                }
            }
        }
        for id in &sets.successful_coordinate {
            if let Some(r) = state.coordinate.get(id) {
                if !r.is_processed && !processed_coordinate.contains(id) {
                    return Err(violation(OP, format!("{} successful but unprocessed", id)));
                }
            }
        }

        for id in &sets.processed_locality {
            if let Some(r) = state.locality.get_mut(id) {
                r.is_processed = true;
            }
        }
        for id in &sets.processed_coordinate {
            if let Some(r) = state.coordinate.get_mut(id) {
                r.is_processed = true;
            }
        }
        for id in &sets.successful_locality {
            if let Some(r) = state.locality.get_mut(id) {
                r.is_successful = true;
            }
        }
        for id in &sets.successful_coordinate {
            if let Some(r) = state.coordinate.get_mut(id) {
                r.is_successful = true;
            }
        }
        Ok(())
    }

    async fn latest_results(&self) -> PipelineResult<Vec<LatestResult>> {
        let state = self.state.lock().await;
        state.check_failure("latest_results")?;

        let run_of = |stored: &StoredResult| {
            state
                .locality
                .get(&stored.result.locality_reading_id)
                .map(|r| (r.run_id, r.station_id))
        };

        let latest_run = state
            .runs
            .iter()
            .rev()
            .map(|(id, _)| *id)
            .find(|id| {
                state
                    .results
                    .iter()
                    .any(|s| run_of(s).map(|(run, _)| run) == Some(*id))
            });
        let Some(latest_run) = latest_run else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<LatestResult> = state
            .results
            .iter()
            .filter_map(|stored| {
                let (run_id, station_id) = run_of(stored)?;
                if run_id != latest_run {
                    return None;
                }
                let station = state.stations.iter().find(|s| s.station_id == station_id)?;
                Some(LatestResult {
                    run_id,
                    locality_id: station.locality_id.clone(),
                    locality_name: station.locality_name.clone(),
                    latitude: station.latitude,
                    longitude: station.longitude,
                    dew_point: round3(stored.result.dew_point),
                    wet_bulb: round3(stored.result.wet_bulb),
                    computed_at: stored.computed_at,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.wet_bulb
                .total_cmp(&a.wet_bulb)
                .then_with(|| a.locality_id.cmp(&b.locality_id))
        });
        Ok(rows)
    }
}
