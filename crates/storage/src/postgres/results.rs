//! Derived result bulk insert.

use sqlx::{PgPool, Postgres, QueryBuilder};

use weather_common::DerivedResult;

use super::rows_per_insert;

pub(super) async fn save_results(
    pool: &PgPool,
    results: &[DerivedResult],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for chunk in results.chunks(rows_per_insert(6)) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO derived_temperatures (result_id, locality_reading_id, \
             coordinate_reading_id, method, dew_point, wet_bulb) ",
        );
        builder.push_values(chunk, |mut row, r| {
            row.push_bind(r.result_id)
                .push_bind(r.locality_reading_id)
                .push_bind(r.coordinate_reading_id)
                .push_bind(r.method.clone())
                .push_bind(r.dew_point)
                .push_bind(r.wet_bulb);
        });
        // A pair that already has a result keeps it.
        builder.push(" ON CONFLICT (locality_reading_id, coordinate_reading_id) DO NOTHING");
        builder.build().execute(&mut *tx).await?;
    }

    tx.commit().await
}
