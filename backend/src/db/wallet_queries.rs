use sqlx::SqlitePool;

use crate::models::WatchedWallet;

/// Inserts the wallet, or relabels it when the address is already watched.
pub async fn upsert(pool: &SqlitePool, address: &str, label: &str) -> Result<WatchedWallet, sqlx::Error> {
    sqlx::query_as::<_, WatchedWallet>(
        "INSERT INTO watched_wallets (address, label)
         VALUES (?, ?)
         ON CONFLICT (address) DO UPDATE SET label = excluded.label
         RETURNING id, address, label, chain",
    )
    .bind(address)
    .bind(label)
    .fetch_one(pool)
    .await
}

/// All watched wallets, alphabetical by label.
pub async fn fetch_all(pool: &SqlitePool) -> Result<Vec<WatchedWallet>, sqlx::Error> {
    sqlx::query_as::<_, WatchedWallet>(
        "SELECT id, address, label, chain
         FROM watched_wallets
         ORDER BY label COLLATE NOCASE ASC, id ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_one(pool: &SqlitePool, id: i64) -> Result<Option<WatchedWallet>, sqlx::Error> {
    sqlx::query_as::<_, WatchedWallet>(
        "SELECT id, address, label, chain FROM watched_wallets WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM watched_wallets WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    const VITALIK: &str = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045";
    const OTHER: &str = "0x1111111111111111111111111111111111111111";

    #[tokio::test]
    async fn test_upsert_relabels_existing_address() {
        let pool = test_pool().await;
        let first = upsert(&pool, VITALIK, "Vitalik").await.unwrap();
        let second = upsert(&pool, VITALIK, "Vitalik Buterin").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.label, "Vitalik Buterin");
        assert_eq!(second.chain, "Ethereum");
        assert_eq!(fetch_all(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_alphabetical_and_delete() {
        let pool = test_pool().await;
        let zed = upsert(&pool, OTHER, "zed fund").await.unwrap();
        upsert(&pool, VITALIK, "Alpha").await.unwrap();

        let labels: Vec<String> = fetch_all(&pool).await.unwrap().into_iter().map(|w| w.label).collect();
        assert_eq!(labels, vec!["Alpha", "zed fund"]);

        assert_eq!(delete(&pool, zed.id).await.unwrap(), 1);
        assert_eq!(delete(&pool, zed.id).await.unwrap(), 0);
        assert!(fetch_one(&pool, zed.id).await.unwrap().is_none());
    }
}
