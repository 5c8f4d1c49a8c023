use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WatchedWallet {
    pub id: i64,
    pub address: String,
    pub label: String,
    pub chain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWatchedWallet {
    pub address: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferDirection {
    In,
    Out,
}

/// ERC-20 transfer relative to the watched address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub timestamp: DateTime<Utc>,
    pub direction: TransferDirection,
    pub token_symbol: String,
    pub amount: f64,
    pub to: String,
    pub from: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletTransfers {
    pub wallet: WatchedWallet,
    pub transfers: Vec<TokenTransfer>,
}
