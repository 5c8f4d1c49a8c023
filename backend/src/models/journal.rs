use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::transaction::TransactionType;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalEntry {
    pub id: i64,
    pub transaction_id: i64,
    pub entry_reason: String,
    pub exit_reason: Option<String>,
    pub lessons_learned: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJournalEntry {
    pub transaction_id: i64,
    pub entry_reason: String,
    #[serde(default)]
    pub exit_reason: Option<String>,
    pub lessons_learned: String,
}

// Journal entry joined with the transaction it reflects on.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalEntryView {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub transaction_id: i64,
    pub asset: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub quantity: f64,
    pub price: f64,
    pub entry_reason: String,
    pub exit_reason: Option<String>,
    pub lessons_learned: String,
}
