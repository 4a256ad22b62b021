//! Per-station collection from both providers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use providers::{CoordinateObservation, LocalityObservation, WeatherProvider};
use weather_common::{
    generate_id, CoordinateReading, LocalityReading, PipelineError, RunId, Station,
};

use crate::fanout::{fan_out, PhaseOutcome, Sink};

/// What to keep when only one provider answers for a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingPolicy {
    /// Keep every successful reading on its own.
    #[default]
    Tolerant,
    /// Keep a station's readings only when both providers answered.
    StrictPair,
}

impl FromStr for PairingPolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tolerant" => Ok(PairingPolicy::Tolerant),
            "strict" | "strict_pair" | "strict-pair" => Ok(PairingPolicy::StrictPair),
            other => Err(PipelineError::Config(format!(
                "unknown pairing policy '{}' (expected tolerant or strict)",
                other
            ))),
        }
    }
}

impl fmt::Display for PairingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingPolicy::Tolerant => f.write_str("tolerant"),
            PairingPolicy::StrictPair => f.write_str("strict"),
        }
    }
}

/// Readings gathered during one run.
#[derive(Debug, Default, Clone)]
pub struct CollectedReadings {
    pub locality: Vec<LocalityReading>,
    pub coordinate: Vec<CoordinateReading>,
}

/// Collects one run's readings, one task per station.
pub struct RunCollector<L, C> {
    locality: Arc<L>,
    coordinate: Arc<C>,
    policy: PairingPolicy,
    max_concurrency: Option<usize>,
}

impl<L, C> RunCollector<L, C>
where
    L: WeatherProvider<Observation = LocalityObservation> + 'static,
    C: WeatherProvider<Observation = CoordinateObservation> + 'static,
{
    pub fn new(
        locality: Arc<L>,
        coordinate: Arc<C>,
        policy: PairingPolicy,
        max_concurrency: Option<usize>,
    ) -> Self {
        Self {
            locality,
            coordinate,
            policy,
            max_concurrency,
        }
    }

    pub fn policy(&self) -> PairingPolicy {
        self.policy
    }

    /// Query both providers for every station and aggregate the successes.
    ///
    /// Per-station failures are logged and recorded in the outcome; they
    /// never stop other stations.
    #[instrument(skip(self, stations), fields(run_id = %run_id, stations = stations.len(), policy = %self.policy))]
    pub async fn collect(
        &self,
        run_id: RunId,
        stations: Vec<Station>,
    ) -> PhaseOutcome<CollectedReadings> {
        let policy = self.policy;
        let locality = Arc::clone(&self.locality);
        let coordinate = Arc::clone(&self.coordinate);

        let outcome = fan_out(stations, self.max_concurrency, move |station, sink| {
            let locality = Arc::clone(&locality);
            let coordinate = Arc::clone(&coordinate);
            async move {
                collect_station(&*locality, &*coordinate, policy, run_id, station, sink).await;
            }
        })
        .await;

        info!(
            locality = outcome.output.locality.len(),
            coordinate = outcome.output.coordinate.len(),
            failures = outcome.failures,
            "Collection finished"
        );
        outcome
    }
}

/// One station's unit of work: call both providers, then contribute.
async fn collect_station<L, C>(
    locality: &L,
    coordinate: &C,
    policy: PairingPolicy,
    run_id: RunId,
    station: Station,
    sink: Sink<CollectedReadings>,
) where
    L: WeatherProvider<Observation = LocalityObservation>,
    C: WeatherProvider<Observation = CoordinateObservation>,
{
    let (a, b) = tokio::join!(locality.fetch(&station), coordinate.fetch(&station));

    let a = a
        .map_err(|e| e.into_pipeline(locality.provider(), &station.locality_id))
        .and_then(|obs| {
            generate_id().map(|id| obs.into_reading(id, station.station_id, run_id))
        });
    let b = b
        .map_err(|e| e.into_pipeline(coordinate.provider(), &station.locality_id))
        .and_then(|obs| {
            generate_id().map(|id| obs.into_reading(id, station.station_id, run_id))
        });

    match (a, b) {
        (Ok(a), Ok(b)) => {
            debug!(station = %station.locality_id, "Both providers answered");
            sink.push(|out| {
                out.locality.push(a);
                out.coordinate.push(b);
            })
            .await;
        }
        (a, b) => {
            let mut errors = Vec::new();
            let mut keep_locality = None;
            let mut keep_coordinate = None;
            match a {
                Ok(reading) => keep_locality = Some(reading),
                Err(e) => errors.push(e),
            }
            match b {
                Ok(reading) => keep_coordinate = Some(reading),
                Err(e) => errors.push(e),
            }

            for err in errors {
                warn!(
                    station = %station.locality_id,
                    kind = err.kind(),
                    error = %err,
                    "Provider call failed"
                );
                sink.fail(err).await;
            }

            if policy == PairingPolicy::Tolerant {
                sink.push(|out| {
                    out.locality.extend(keep_locality);
                    out.coordinate.extend(keep_coordinate);
                })
                .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parsing() {
        assert_eq!("tolerant".parse::<PairingPolicy>().unwrap(), PairingPolicy::Tolerant);
        assert_eq!("STRICT".parse::<PairingPolicy>().unwrap(), PairingPolicy::StrictPair);
        assert!(matches!(
            "lenient".parse::<PairingPolicy>(),
            Err(PipelineError::Config(_))
        ));
        assert_eq!(PairingPolicy::default(), PairingPolicy::Tolerant);
        assert_eq!(PairingPolicy::StrictPair.to_string(), "strict");
    }
}
