//! Latest-run results feed.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use weather_common::{LatestResult, RunId};

const LATEST_RESULTS_SQL: &str = r#"
WITH latest_run AS (
    SELECT r.run_id
    FROM measurement_runs r
    WHERE EXISTS (
        SELECT 1
        FROM derived_temperatures d
        JOIN readings_locality l ON l.reading_id = d.locality_reading_id
        WHERE l.run_id = r.run_id
    )
    ORDER BY r.started_at DESC
    LIMIT 1
)
SELECT
    l.run_id,
    s.locality_id,
    s.locality_name,
    s.latitude,
    s.longitude,
    ROUND(d.dew_point::numeric, 3)::float8 AS dew_point,
    ROUND(d.wet_bulb::numeric, 3)::float8 AS wet_bulb,
    d.computed_at
FROM derived_temperatures d
JOIN readings_locality l ON l.reading_id = d.locality_reading_id
JOIN stations s ON s.station_id = l.station_id
JOIN latest_run lr ON lr.run_id = l.run_id
ORDER BY wet_bulb DESC, s.locality_id
"#;

#[derive(Debug, FromRow)]
struct LatestRow {
    run_id: Uuid,
    locality_id: String,
    locality_name: String,
    latitude: f64,
    longitude: f64,
    dew_point: f64,
    wet_bulb: f64,
    computed_at: DateTime<Utc>,
}

impl From<LatestRow> for LatestResult {
    fn from(row: LatestRow) -> Self {
        LatestResult {
            run_id: RunId(row.run_id),
            locality_id: row.locality_id,
            locality_name: row.locality_name,
            latitude: row.latitude,
            longitude: row.longitude,
            dew_point: row.dew_point,
            wet_bulb: row.wet_bulb,
            computed_at: row.computed_at,
        }
    }
}

pub(super) async fn latest_results(pool: &PgPool) -> Result<Vec<LatestResult>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LatestRow>(LATEST_RESULTS_SQL)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(LatestResult::from).collect())
}
