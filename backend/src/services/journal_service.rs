use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::db;
use crate::errors::AppError;
use crate::models::{CreateJournalEntry, JournalEntry, JournalEntryView};

pub async fn create(pool: &SqlitePool, input: CreateJournalEntry) -> Result<JournalEntry, AppError> {
    if input.entry_reason.trim().is_empty() {
        return Err(AppError::Validation("Entry reason is required".into()));
    }
    if input.lessons_learned.trim().is_empty() {
        return Err(AppError::Validation("Lessons learned is required".into()));
    }

    if db::transaction_queries::fetch_one(pool, input.transaction_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Transaction {} not found", input.transaction_id)));
    }

    let input = CreateJournalEntry {
        entry_reason: input.entry_reason.trim().to_string(),
        exit_reason: input
            .exit_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
        lessons_learned: input.lessons_learned.trim().to_string(),
        ..input
    };

    let entry = db::journal_queries::create(pool, &input, Utc::now()).await?;
    info!("Journal entry {} added for transaction {}", entry.id, entry.transaction_id);
    Ok(entry)
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<JournalEntryView>, AppError> {
    Ok(db::journal_queries::fetch_all(pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::{NewTransaction, TransactionType};

    fn entry(transaction_id: i64, entry_reason: &str, lessons: &str) -> CreateJournalEntry {
        CreateJournalEntry {
            transaction_id,
            entry_reason: entry_reason.to_string(),
            exit_reason: Some("   ".to_string()),
            lessons_learned: lessons.to_string(),
        }
    }

    #[tokio::test]
    async fn test_requires_existing_transaction() {
        let pool = test_pool().await;
        let err = create(&pool, entry(42, "FOMO", "Don't")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_blank_fields_rejected() {
        let pool = test_pool().await;
        assert!(matches!(create(&pool, entry(1, " ", "x")).await, Err(AppError::Validation(_))));
        assert!(matches!(create(&pool, entry(1, "x", "")).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_blank_exit_reason_stored_as_none() {
        let pool = test_pool().await;
        let tx = db::transaction_queries::create(
            &pool,
            &NewTransaction {
                asset: "BTC".to_string(),
                tx_type: TransactionType::Sell,
                quantity: 0.1,
                price_usd: 65000.0,
                timestamp: Utc::now(),
            },
        )
        .await
        .unwrap();

        let saved = create(&pool, entry(tx.id, " Took profit ", "Scale out earlier")).await.unwrap();
        assert_eq!(saved.entry_reason, "Took profit");
        assert_eq!(saved.exit_reason, None);

        let listed = list(&pool).await.unwrap();
        assert_eq!(listed[0].asset, "BTC");
        assert_eq!(listed[0].tx_type, TransactionType::Sell);
    }
}
