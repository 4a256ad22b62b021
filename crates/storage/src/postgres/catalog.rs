//! Station catalog reads.

use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use weather_common::Station;

use super::rows_per_insert;

#[derive(Debug, FromRow)]
struct StationRow {
    station_id: Uuid,
    locality_id: String,
    locality_name: String,
    city_name: String,
    latitude: f64,
    longitude: f64,
    device_type: Option<String>,
}

impl From<StationRow> for Station {
    fn from(row: StationRow) -> Self {
        Station {
            station_id: row.station_id,
            locality_id: row.locality_id,
            locality_name: row.locality_name,
            city_name: row.city_name,
            latitude: row.latitude,
            longitude: row.longitude,
            device_type: row.device_type,
        }
    }
}

pub(super) async fn list_stations(
    pool: &PgPool,
    limit: Option<u32>,
) -> Result<Vec<Station>, sqlx::Error> {
    // LIMIT NULL means no limit.
    let rows = sqlx::query_as::<_, StationRow>(
        "SELECT station_id, locality_id, locality_name, city_name, \
         latitude, longitude, device_type FROM stations \
         ORDER BY city_name, locality_name LIMIT $1",
    )
    .bind(limit.map(i64::from))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Station::from).collect())
}

pub(super) async fn upsert_stations(
    pool: &PgPool,
    stations: &[Station],
) -> Result<(), sqlx::Error> {
    for chunk in stations.chunks(rows_per_insert(7)) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO stations (station_id, locality_id, locality_name, city_name, \
             latitude, longitude, device_type) ",
        );
        builder.push_values(chunk, |mut row, s| {
            row.push_bind(s.station_id)
                .push_bind(s.locality_id.clone())
                .push_bind(s.locality_name.clone())
                .push_bind(s.city_name.clone())
                .push_bind(s.latitude)
                .push_bind(s.longitude)
                .push_bind(s.device_type.clone());
        });
        builder.push(
            " ON CONFLICT (station_id) DO UPDATE SET \
             locality_id = EXCLUDED.locality_id, \
             locality_name = EXCLUDED.locality_name, \
             city_name = EXCLUDED.city_name, \
             latitude = EXCLUDED.latitude, \
             longitude = EXCLUDED.longitude, \
             device_type = EXCLUDED.device_type",
        );
        builder.build().execute(pool).await?;
    }
    Ok(())
}
