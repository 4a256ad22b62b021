//! Common test fixtures for pipeline tests.

use uuid::Uuid;

use weather_common::{CoordinateReading, CorrelatedPair, LocalityReading, RunId, Station};

/// Station number `n`, with a locality id of the form `ZWL00000n`.
pub fn station(n: usize) -> Station {
    Station {
        station_id: Uuid::new_v4(),
        locality_id: format!("ZWL{:06}", n),
        locality_name: format!("Locality {}", n),
        city_name: "Bengaluru".to_string(),
        latitude: 12.9 + n as f64 * 0.001,
        longitude: 77.5 + n as f64 * 0.001,
        device_type: None,
    }
}

/// Stations `1..=count`.
pub fn stations(count: usize) -> Vec<Station> {
    (1..=count).map(station).collect()
}

pub fn run_id() -> RunId {
    RunId(Uuid::new_v4())
}

/// Locality reading carrying the two computation inputs it provides.
pub fn locality_reading(
    station: &Station,
    run_id: RunId,
    temperature: Option<f64>,
    humidity: Option<f64>,
) -> LocalityReading {
    LocalityReading {
        status: Some("200".to_string()),
        temperature,
        humidity,
        ..LocalityReading::empty(Uuid::new_v4(), station.station_id, run_id)
    }
}

/// Coordinate reading carrying the pressure input.
pub fn coordinate_reading(
    station: &Station,
    run_id: RunId,
    pressure: Option<f64>,
) -> CoordinateReading {
    CoordinateReading {
        latitude: Some(station.latitude),
        longitude: Some(station.longitude),
        pressure,
        ..CoordinateReading::empty(Uuid::new_v4(), station.station_id, run_id)
    }
}

/// A pair built from two readings, as the selector would return it.
pub fn pair_of(a: &LocalityReading, b: &CoordinateReading) -> Option<CorrelatedPair> {
    Some(CorrelatedPair {
        locality_reading_id: a.reading_id,
        coordinate_reading_id: b.reading_id,
        station_id: a.station_id,
        run_id: a.run_id,
        temperature: a.temperature?,
        humidity: a.humidity?,
        pressure: b.pressure?,
    })
}

/// `count` synthetic pairs that never touch storage.
pub fn synthetic_pairs(count: usize) -> Vec<CorrelatedPair> {
    let run = run_id();
    (0..count)
        .map(|i| CorrelatedPair {
            locality_reading_id: Uuid::new_v4(),
            coordinate_reading_id: Uuid::new_v4(),
            station_id: Uuid::new_v4(),
            run_id: run,
            temperature: 20.0 + (i % 15) as f64,
            humidity: 40.0 + (i % 50) as f64,
            pressure: 1000.0 + (i % 20) as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_ids_are_distinct() {
        let all = stations(3);
        assert_eq!(all[0].locality_id, "ZWL000001");
        assert_ne!(all[0].station_id, all[1].station_id);
    }

    #[test]
    fn test_pair_of_requires_inputs() {
        let s = station(1);
        let run = run_id();
        let a = locality_reading(&s, run, Some(30.0), None);
        let b = coordinate_reading(&s, run, Some(1008.0));
        assert!(pair_of(&a, &b).is_none());

        let a = locality_reading(&s, run, Some(30.0), Some(70.0));
        let pair = pair_of(&a, &b).unwrap();
        assert_eq!(pair.pressure, 1008.0);
        assert_eq!(pair.run_id, run);
    }
}
