use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::models::PortfolioSnapshot;

/// Records the value for `snapshot_date` unless that date already has one.
/// Returns whether a row was written.
pub async fn insert_if_absent(
    pool: &SqlitePool,
    snapshot_date: NaiveDate,
    total_value_usd: f64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO portfolio_history (snapshot_date, total_value_usd)
         VALUES (?, ?)
         ON CONFLICT (snapshot_date) DO NOTHING",
    )
    .bind(snapshot_date)
    .bind(total_value_usd)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// All snapshots, oldest first.
pub async fn fetch_history(pool: &SqlitePool) -> Result<Vec<PortfolioSnapshot>, sqlx::Error> {
    sqlx::query_as::<_, PortfolioSnapshot>(
        "SELECT snapshot_date, total_value_usd
         FROM portfolio_history
         ORDER BY snapshot_date ASC",
    )
    .fetch_all(pool)
    .await
}
