use sqlx::SqlitePool;

use crate::models::{NewTransaction, Transaction, TransactionType};

pub async fn create(pool: &SqlitePool, input: &NewTransaction) -> Result<Transaction, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        "INSERT INTO transactions (timestamp, asset, type, quantity, price)
         VALUES (?, ?, ?, ?, ?)
         RETURNING id, timestamp, asset, type, quantity, price",
    )
    .bind(input.timestamp)
    .bind(&input.asset)
    .bind(input.tx_type)
    .bind(input.quantity)
    .bind(input.price_usd)
    .fetch_one(pool)
    .await
}

/// All transactions, newest first.
pub async fn fetch_all(pool: &SqlitePool) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        "SELECT id, timestamp, asset, type, quantity, price
         FROM transactions
         ORDER BY timestamp DESC, id DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_one(pool: &SqlitePool, id: i64) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        "SELECT id, timestamp, asset, type, quantity, price
         FROM transactions
         WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn total_deposits(pool: &SqlitePool) -> Result<f64, sqlx::Error> {
    let total: Option<f64> = sqlx::query_scalar(
        "SELECT SUM(quantity) FROM transactions WHERE type = ?",
    )
    .bind(TransactionType::Deposit)
    .fetch_one(pool)
    .await?;

    Ok(total.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::{Duration, Utc};

    fn new_tx(asset: &str, tx_type: TransactionType, quantity: f64, minutes_ago: i64) -> NewTransaction {
        NewTransaction {
            asset: asset.to_string(),
            tx_type,
            quantity,
            price_usd: 100.0,
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_fetch_all_is_newest_first() {
        let pool = test_pool().await;
        create(&pool, &new_tx("BTC", TransactionType::Buy, 1.0, 30)).await.unwrap();
        create(&pool, &new_tx("ETH", TransactionType::Buy, 2.0, 10)).await.unwrap();
        create(&pool, &new_tx("SOL", TransactionType::Sell, 3.0, 20)).await.unwrap();

        let all = fetch_all(&pool).await.unwrap();
        let assets: Vec<&str> = all.iter().map(|t| t.asset.as_str()).collect();
        assert_eq!(assets, vec!["ETH", "SOL", "BTC"]);
        assert_eq!(all[1].tx_type, TransactionType::Sell);
    }

    #[tokio::test]
    async fn test_total_deposits() {
        let pool = test_pool().await;
        assert_eq!(total_deposits(&pool).await.unwrap(), 0.0);

        create(&pool, &new_tx("USDT", TransactionType::Deposit, 500.0, 3)).await.unwrap();
        create(&pool, &new_tx("USDT", TransactionType::Deposit, 250.0, 2)).await.unwrap();
        create(&pool, &new_tx("BTC", TransactionType::Buy, 1.0, 1)).await.unwrap();

        assert_eq!(total_deposits(&pool).await.unwrap(), 750.0);
    }

    #[tokio::test]
    async fn test_fetch_one_round_trips_fields() {
        let pool = test_pool().await;
        let created = create(&pool, &new_tx("BTC", TransactionType::Buy, 0.25, 0)).await.unwrap();

        let fetched = fetch_one(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(fetched.asset, "BTC");
        assert_eq!(fetched.quantity, 0.25);
        assert_eq!(fetched.price, 100.0);
        assert_eq!(fetched.timestamp, created.timestamp);
        assert!(fetch_one(&pool, created.id + 1).await.unwrap().is_none());
    }
}
