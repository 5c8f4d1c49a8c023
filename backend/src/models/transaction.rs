use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::presentation::Currency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Buy,
    Sell,
    Deposit,
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(TransactionType::Buy),
            "SELL" => Ok(TransactionType::Sell),
            "DEPOSIT" => Ok(TransactionType::Deposit),
            other => Err(format!("Unknown transaction type '{}'", other)),
        }
    }
}

// A recorded buy, sell or cash deposit. Never updated once written.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub asset: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub quantity: f64,
    /// Unit price in USD.
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransaction {
    pub asset: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub quantity: f64,
    /// Unit price expressed in `currency`.
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A validated transaction ready to be written, price already in USD.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub asset: String,
    pub tx_type: TransactionType,
    pub quantity: f64,
    pub price_usd: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub imported: usize,
    pub errors: Vec<String>,
}
