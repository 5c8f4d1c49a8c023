use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{CreateJournalEntry, JournalEntry, JournalEntryView};

pub async fn create(
    pool: &SqlitePool,
    input: &CreateJournalEntry,
    timestamp: DateTime<Utc>,
) -> Result<JournalEntry, sqlx::Error> {
    sqlx::query_as::<_, JournalEntry>(
        "INSERT INTO trading_journal (transaction_id, entry_reason, exit_reason, lessons_learned, timestamp)
         VALUES (?, ?, ?, ?, ?)
         RETURNING id, transaction_id, entry_reason, exit_reason, lessons_learned, timestamp",
    )
    .bind(input.transaction_id)
    .bind(&input.entry_reason)
    .bind(&input.exit_reason)
    .bind(&input.lessons_learned)
    .bind(timestamp)
    .fetch_one(pool)
    .await
}

/// Entries joined with their transaction, newest first.
pub async fn fetch_all(pool: &SqlitePool) -> Result<Vec<JournalEntryView>, sqlx::Error> {
    sqlx::query_as::<_, JournalEntryView>(
        "SELECT j.id, j.timestamp, j.transaction_id, t.asset, t.type, t.quantity, t.price,
                j.entry_reason, j.exit_reason, j.lessons_learned
         FROM trading_journal j
         JOIN transactions t ON j.transaction_id = t.id
         ORDER BY j.timestamp DESC, j.id DESC",
    )
    .fetch_all(pool)
    .await
}
