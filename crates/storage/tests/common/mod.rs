//! Store behaviour checks shared by the in-memory and PostgreSQL suites.

use uuid::Uuid;

use storage::PipelineStore;
use test_utils::{coordinate_reading, locality_reading, pair_of, run_id};
use weather_common::{DerivedResult, Station, ThermoOutputs};

/// Seeded `stations` must hold at least three stations.
pub async fn unprocessed_selection_respects_flags(store: &dyn PipelineStore, stations: &[Station]) {
    let run = run_id();
    let a: Vec<_> = stations[..3]
        .iter()
        .map(|s| locality_reading(s, run, Some(30.0), Some(65.0)))
        .collect();
    let mut b: Vec<_> = stations[..3]
        .iter()
        .map(|s| coordinate_reading(s, run, Some(1006.0)))
        .collect();
    // Station 3 has no pressure: never eligible.
    b[2].pressure = None;

    store.save_run(run, &a, &b).await.unwrap();

    let pairs: Vec<_> = store
        .unprocessed_pairs()
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.run_id == run)
        .collect();
    assert_eq!(pairs.len(), 2);
    assert!(pairs.iter().all(|p| p.station_id != stations[2].station_id));

    // Consume station 1 only.
    let first = pair_of(&a[0], &b[0]).unwrap();
    store.reconcile_flags(&[first.clone()], &[]).await.unwrap();

    let remaining: Vec<_> = store
        .unprocessed_pairs()
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.run_id == run)
        .collect();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].station_id, stations[1].station_id);
    assert!(remaining
        .iter()
        .all(|p| p.locality_reading_id != first.locality_reading_id));
}

/// Results exist exactly for the pairs flagged successful, and reconciling
/// twice changes nothing.
pub async fn results_and_flags_agree(store: &dyn PipelineStore, stations: &[Station]) {
    let run = run_id();
    let a: Vec<_> = stations[..2]
        .iter()
        .map(|s| locality_reading(s, run, Some(33.0), Some(55.0)))
        .collect();
    let b: Vec<_> = stations[..2]
        .iter()
        .map(|s| coordinate_reading(s, run, Some(1002.0)))
        .collect();
    store.save_run(run, &a, &b).await.unwrap();

    let attempted: Vec<_> = a
        .iter()
        .zip(&b)
        .filter_map(|(x, y)| pair_of(x, y))
        .collect();
    let succeeded = vec![DerivedResult::from_pair(
        Uuid::new_v4(),
        &attempted[0],
        "test-method",
        ThermoOutputs {
            dew_point: 22.81234,
            wet_bulb: 25.45678,
        },
    )];

    store.save_results(&succeeded).await.unwrap();
    store.reconcile_flags(&attempted, &succeeded).await.unwrap();
    // Second application: same final state, no error.
    store.reconcile_flags(&attempted, &succeeded).await.unwrap();

    let pairs = store.unprocessed_pairs().await.unwrap();
    assert!(pairs.iter().all(|p| p.run_id != run));

    let latest = store.latest_results().await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].run_id, run);
    assert_eq!(latest[0].locality_id, stations[0].locality_id);
    assert_eq!(latest[0].wet_bulb, 25.457);
    assert_eq!(latest[0].dew_point, 22.812);
}

/// A successful flag without a processed flag is rejected as a whole.
pub async fn success_requires_processed(store: &dyn PipelineStore, stations: &[Station]) {
    let run = run_id();
    let a = locality_reading(&stations[0], run, Some(28.0), Some(80.0));
    let b = coordinate_reading(&stations[0], run, Some(1011.0));
    store.save_run(run, &[a.clone()], &[b.clone()]).await.unwrap();

    let pair = pair_of(&a, &b).unwrap();
    let result = DerivedResult::from_pair(
        Uuid::new_v4(),
        &pair,
        "test-method",
        ThermoOutputs {
            dew_point: 24.4,
            wet_bulb: 25.3,
        },
    );

    let err = store.reconcile_flags(&[], &[result]).await.unwrap_err();
    assert!(err.is_fatal());

    // Nothing was applied: the pair is still eligible.
    let pairs = store.unprocessed_pairs().await.unwrap();
    assert!(pairs.iter().any(|p| p.locality_reading_id == a.reading_id));
}

/// Absent fields come back absent, and an empty run is still recorded.
pub async fn empty_and_partial_runs(store: &dyn PipelineStore, stations: &[Station]) {
    store.save_run(run_id(), &[], &[]).await.unwrap();

    let run = run_id();
    let rain_gauge = locality_reading(&stations[0], run, None, None);
    store.save_run(run, &[rain_gauge], &[]).await.unwrap();

    let pairs = store.unprocessed_pairs().await.unwrap();
    assert!(pairs.iter().all(|p| p.run_id != run));
}

/// A reading for the same station twice in one run is refused atomically.
pub async fn duplicate_station_in_run_is_rejected(store: &dyn PipelineStore, stations: &[Station]) {
    let run = run_id();
    let first = locality_reading(&stations[0], run, Some(30.0), Some(60.0));
    let second = locality_reading(&stations[0], run, Some(31.0), Some(61.0));
    let b = coordinate_reading(&stations[0], run, Some(1000.0));

    let err = store.save_run(run, &[first, second], &[b]).await.unwrap_err();
    assert!(err.is_fatal());

    let pairs = store.unprocessed_pairs().await.unwrap();
    assert!(pairs.iter().all(|p| p.run_id != run));
}

/// A result stored by a pass whose reconciliation never ran, followed by a
/// reconciliation in which the retried pair failed. Returns the pair's
/// locality and coordinate reading ids; both must end up successful.
pub async fn stored_result_survives_failed_retry(
    store: &dyn PipelineStore,
    stations: &[Station],
) -> (Uuid, Uuid) {
    let run = run_id();
    let a = locality_reading(&stations[0], run, Some(31.0), Some(62.0));
    let b = coordinate_reading(&stations[0], run, Some(1008.0));
    store.save_run(run, &[a.clone()], &[b.clone()]).await.unwrap();

    let pair = pair_of(&a, &b).unwrap();
    let earlier = DerivedResult::from_pair(
        Uuid::new_v4(),
        &pair,
        "test-method",
        ThermoOutputs {
            dew_point: 23.0,
            wet_bulb: 25.1,
        },
    );
    store.save_results(&[earlier]).await.unwrap();

    // The retry computed nothing for the pair.
    store.reconcile_flags(&[pair.clone()], &[]).await.unwrap();

    let pairs = store.unprocessed_pairs().await.unwrap();
    assert!(pairs.iter().all(|p| p.locality_reading_id != a.reading_id));

    let latest = store.latest_results().await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].wet_bulb, 25.1);

    (a.reading_id, b.reading_id)
}
