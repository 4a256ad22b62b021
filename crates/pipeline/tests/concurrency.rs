//! Fan-out aggregation under randomized latency and failures.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use pipeline::{CalculationWorker, PairingPolicy, RunCollector};
use test_utils::{
    run_id, stations, synthetic_pairs, Script, ScriptedCalculator, ScriptedCoordinate,
    ScriptedLocality,
};

const UNITS: usize = 120;
const REPEATS: usize = 5;

#[tokio::test]
async fn test_collector_aggregates_exactly_the_successful_units() {
    for _ in 0..REPEATS {
        let catalog = stations(UNITS);
        let keys: Vec<String> = catalog.iter().map(|s| s.locality_id.clone()).collect();

        let locality = Arc::new(ScriptedLocality::new(
            Script::new()
                .latency(Duration::from_millis(15))
                .fail_randomly(keys.clone(), 0.2),
        ));
        let coordinate = Arc::new(ScriptedCoordinate::new(
            Script::new()
                .latency(Duration::from_millis(15))
                .fail_randomly(keys.clone(), 0.2),
        ));
        let failing_a: HashSet<String> = locality.script.failing_keys().into_iter().collect();
        let failing_b: HashSet<String> = coordinate.script.failing_keys().into_iter().collect();

        let collector = RunCollector::new(
            Arc::clone(&locality),
            Arc::clone(&coordinate),
            PairingPolicy::Tolerant,
            None,
        );
        let run = run_id();
        let outcome = collector.collect(run, catalog.clone()).await;

        assert_eq!(outcome.output.locality.len(), UNITS - failing_a.len());
        assert_eq!(outcome.output.coordinate.len(), UNITS - failing_b.len());
        assert_eq!(outcome.failures, failing_a.len() + failing_b.len());
        assert_eq!(outcome.first_error.is_some(), outcome.failures > 0);
        assert_eq!(locality.script.calls(), UNITS);
        assert_eq!(coordinate.script.calls(), UNITS);

        // No duplicates, nothing from a failing station, every reading in this run.
        let stations_a: HashSet<_> = outcome.output.locality.iter().map(|r| r.station_id).collect();
        assert_eq!(stations_a.len(), outcome.output.locality.len());
        let ids_a: HashSet<_> = outcome.output.locality.iter().map(|r| r.reading_id).collect();
        assert_eq!(ids_a.len(), outcome.output.locality.len());
        for station in &catalog {
            let expected = !failing_a.contains(&station.locality_id);
            assert_eq!(stations_a.contains(&station.station_id), expected);
        }
        assert!(outcome.output.locality.iter().all(|r| r.run_id == run));
        assert!(outcome.output.coordinate.iter().all(|r| r.run_id == run));
    }
}

#[tokio::test]
async fn test_strict_collector_keeps_only_complete_stations() {
    for _ in 0..REPEATS {
        let catalog = stations(UNITS);
        let keys: Vec<String> = catalog.iter().map(|s| s.locality_id.clone()).collect();

        let locality = Arc::new(ScriptedLocality::new(
            Script::new()
                .latency(Duration::from_millis(10))
                .fail_randomly(keys.clone(), 0.15),
        ));
        let coordinate = Arc::new(ScriptedCoordinate::new(
            Script::new()
                .latency(Duration::from_millis(10))
                .fail_randomly(keys.clone(), 0.15),
        ));
        let failing: HashSet<String> = locality
            .script
            .failing_keys()
            .into_iter()
            .chain(coordinate.script.failing_keys())
            .collect();

        let collector = RunCollector::new(locality, coordinate, PairingPolicy::StrictPair, Some(16));
        let outcome = collector.collect(run_id(), catalog).await;

        assert_eq!(outcome.output.locality.len(), UNITS - failing.len());
        assert_eq!(outcome.output.coordinate.len(), UNITS - failing.len());

        let a: HashSet<_> = outcome.output.locality.iter().map(|r| r.station_id).collect();
        let b: HashSet<_> = outcome.output.coordinate.iter().map(|r| r.station_id).collect();
        assert_eq!(a, b);
    }
}

#[tokio::test]
async fn test_worker_aggregates_exactly_the_successful_units() {
    for _ in 0..REPEATS {
        let pairs = synthetic_pairs(UNITS);
        // Keyed by temperature, so one key may fail several pairs.
        let keys: HashSet<String> = pairs.iter().map(|p| p.temperature.to_string()).collect();
        let calculator = Arc::new(ScriptedCalculator::new(
            Script::new()
                .latency(Duration::from_millis(15))
                .fail_randomly(keys, 0.25),
        ));
        let failing: HashSet<String> = calculator.script.failing_keys().into_iter().collect();
        let expected_failures = pairs
            .iter()
            .filter(|p| failing.contains(&p.temperature.to_string()))
            .count();

        let worker = CalculationWorker::new(calculator.clone(), None);
        let outcome = worker.compute(pairs.clone()).await;

        assert_eq!(outcome.output.len(), UNITS - expected_failures);
        assert_eq!(outcome.failures, expected_failures);
        assert_eq!(calculator.script.calls(), UNITS);

        let computed: HashSet<_> = outcome
            .output
            .iter()
            .map(|r| (r.locality_reading_id, r.coordinate_reading_id))
            .collect();
        assert_eq!(computed.len(), outcome.output.len());
        for pair in &pairs {
            let ok = !failing.contains(&pair.temperature.to_string());
            assert_eq!(
                computed.contains(&(pair.locality_reading_id, pair.coordinate_reading_id)),
                ok
            );
        }
        let result_ids: HashSet<_> = outcome.output.iter().map(|r| r.result_id).collect();
        assert_eq!(result_ids.len(), outcome.output.len());
        assert!(outcome.output.iter().all(|r| r.method == "scripted-v1"));
    }
}

#[tokio::test]
async fn test_panicking_calculation_does_not_lose_siblings() {
    let pairs = synthetic_pairs(30);
    let panicking = pairs[0].temperature.to_string();
    let doomed = pairs
        .iter()
        .filter(|p| p.temperature.to_string() == panicking)
        .count();

    let calculator = Arc::new(ScriptedCalculator::new(Script::new().panic(panicking)));
    let worker = CalculationWorker::new(calculator, Some(5));
    let outcome = worker.compute(pairs).await;

    assert_eq!(outcome.output.len(), 30 - doomed);
    assert_eq!(outcome.failures, doomed);
    assert!(outcome.fatal_error.is_none());
}
