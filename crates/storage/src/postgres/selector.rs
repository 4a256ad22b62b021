//! Unprocessed pair selection.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use weather_common::{CorrelatedPair, RunId};

const UNPROCESSED_PAIRS_SQL: &str = r#"
SELECT
    l.reading_id AS locality_reading_id,
    c.reading_id AS coordinate_reading_id,
    l.station_id,
    l.run_id,
    l.temperature,
    l.humidity,
    c.pressure
FROM readings_locality l
JOIN readings_coordinate c
    ON c.station_id = l.station_id AND c.run_id = l.run_id
WHERE NOT l.is_processed
  AND NOT c.is_processed
  AND l.temperature IS NOT NULL
  AND l.humidity IS NOT NULL
  AND c.pressure IS NOT NULL
"#;

#[derive(Debug, FromRow)]
struct PairRow {
    locality_reading_id: Uuid,
    coordinate_reading_id: Uuid,
    station_id: Uuid,
    run_id: Uuid,
    temperature: f64,
    humidity: f64,
    pressure: f64,
}

impl From<PairRow> for CorrelatedPair {
    fn from(row: PairRow) -> Self {
        CorrelatedPair {
            locality_reading_id: row.locality_reading_id,
            coordinate_reading_id: row.coordinate_reading_id,
            station_id: row.station_id,
            run_id: RunId(row.run_id),
            temperature: row.temperature,
            humidity: row.humidity,
            pressure: row.pressure,
        }
    }
}

pub(super) async fn unprocessed_pairs(pool: &PgPool) -> Result<Vec<CorrelatedPair>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PairRow>(UNPROCESSED_PAIRS_SQL)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(CorrelatedPair::from).collect())
}
