//! Processed/successful flag reconciliation.

use sqlx::PgPool;

use crate::FlagSets;

/// Apply the four flag updates in one transaction. Processed flags go first
/// so the successful-implies-processed check holds after every statement.
pub(super) async fn reconcile(pool: &PgPool, sets: &FlagSets) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE readings_locality SET is_processed = TRUE WHERE reading_id = ANY($1)")
        .bind(&sets.processed_locality)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE readings_coordinate SET is_processed = TRUE WHERE reading_id = ANY($1)")
        .bind(&sets.processed_coordinate)
        .execute(&mut *tx)
        .await?;

    // An attempted pair whose result was stored by an earlier, unreconciled
    // pass counts as successful even if this attempt failed.
    sqlx::query(
        r#"
        UPDATE readings_locality SET is_successful = TRUE
        WHERE reading_id = ANY($1)
           OR reading_id IN (
               SELECT locality_reading_id FROM derived_temperatures
               WHERE locality_reading_id = ANY($2) AND coordinate_reading_id = ANY($3)
           )
        "#,
    )
    .bind(&sets.successful_locality)
    .bind(&sets.processed_locality)
    .bind(&sets.processed_coordinate)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE readings_coordinate SET is_successful = TRUE
        WHERE reading_id = ANY($1)
           OR reading_id IN (
               SELECT coordinate_reading_id FROM derived_temperatures
               WHERE locality_reading_id = ANY($2) AND coordinate_reading_id = ANY($3)
           )
        "#,
    )
    .bind(&sets.successful_coordinate)
    .bind(&sets.processed_locality)
    .bind(&sets.processed_coordinate)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}
