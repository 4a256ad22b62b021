//! Run and reading bulk inserts.

use sqlx::{PgPool, Postgres, QueryBuilder};

use weather_common::{CoordinateReading, LocalityReading, RunId};

use super::rows_per_insert;

const LOCALITY_COLUMNS: &str = "INSERT INTO readings_locality (\
    reading_id, station_id, run_id, status, message, device_type, \
    temperature, humidity, wind_speed, wind_direction, rain_intensity, rain_accumulation, \
    is_processed, is_successful) ";

const COORDINATE_COLUMNS: &str = "INSERT INTO readings_coordinate (\
    reading_id, station_id, run_id, latitude, longitude, timezone, timezone_offset, \
    observed_at, sunrise, sunset, temperature, feels_like, pressure, humidity, dew_point, \
    uv_index, clouds, visibility, wind_speed, wind_direction, wind_gust, \
    condition_id, condition_main, condition_description, condition_icon, \
    is_processed, is_successful) ";

/// Write the run row and both reading batches in one transaction.
pub(super) async fn save_run(
    pool: &PgPool,
    run_id: RunId,
    locality: &[LocalityReading],
    coordinate: &[CoordinateReading],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO measurement_runs (run_id) VALUES ($1)")
        .bind(run_id.as_uuid())
        .execute(&mut *tx)
        .await?;

    for chunk in locality.chunks(rows_per_insert(14)) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(LOCALITY_COLUMNS);
        builder.push_values(chunk, |mut row, r| {
            row.push_bind(r.reading_id)
                .push_bind(r.station_id)
                .push_bind(r.run_id.as_uuid())
                .push_bind(r.status.clone())
                .push_bind(r.message.clone())
                .push_bind(r.device_type)
                .push_bind(r.temperature)
                .push_bind(r.humidity)
                .push_bind(r.wind_speed)
                .push_bind(r.wind_direction)
                .push_bind(r.rain_intensity)
                .push_bind(r.rain_accumulation)
                .push_bind(r.is_processed)
                .push_bind(r.is_successful);
        });
        builder.build().execute(&mut *tx).await?;
    }

    for chunk in coordinate.chunks(rows_per_insert(27)) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(COORDINATE_COLUMNS);
        builder.push_values(chunk, |mut row, r| {
            row.push_bind(r.reading_id)
                .push_bind(r.station_id)
                .push_bind(r.run_id.as_uuid())
                .push_bind(r.latitude)
                .push_bind(r.longitude)
                .push_bind(r.timezone.clone())
                .push_bind(r.timezone_offset)
                .push_bind(r.observed_at)
                .push_bind(r.sunrise)
                .push_bind(r.sunset)
                .push_bind(r.temperature)
                .push_bind(r.feels_like)
                .push_bind(r.pressure)
                .push_bind(r.humidity)
                .push_bind(r.dew_point)
                .push_bind(r.uv_index)
                .push_bind(r.clouds)
                .push_bind(r.visibility)
                .push_bind(r.wind_speed)
                .push_bind(r.wind_direction)
                .push_bind(r.wind_gust)
                .push_bind(r.condition_id)
                .push_bind(r.condition_main.clone())
                .push_bind(r.condition_description.clone())
                .push_bind(r.condition_icon.clone())
                .push_bind(r.is_processed)
                .push_bind(r.is_successful);
        });
        builder.build().execute(&mut *tx).await?;
    }

    tx.commit().await
}
