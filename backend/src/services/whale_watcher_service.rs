use std::sync::OnceLock;

use regex::Regex;
use sqlx::SqlitePool;
use tracing::info;

use crate::db;
use crate::errors::AppError;
use crate::external::etherscan::ChainHistoryProvider;
use crate::models::{CreateWatchedWallet, WalletTransfers, WatchedWallet};

pub const DEFAULT_TRANSFER_LIMIT: u32 = 25;
pub const MAX_TRANSFER_LIMIT: u32 = 100;

fn address_pattern() -> Result<&'static Regex, AppError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$"))
        .as_ref()
        .map_err(|e| AppError::Validation(format!("address pattern unavailable: {}", e)))
}

/// Lowercased address, or a validation error when it is not `0x` + 40 hex chars.
pub fn normalize_address(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if !address_pattern()?.is_match(trimmed) {
        return Err(AppError::Validation(format!("'{}' is not a valid Ethereum address", trimmed)));
    }
    Ok(trimmed.to_lowercase())
}

pub fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_TRANSFER_LIMIT).clamp(1, MAX_TRANSFER_LIMIT)
}

pub async fn add_wallet(pool: &SqlitePool, input: CreateWatchedWallet) -> Result<WatchedWallet, AppError> {
    let address = normalize_address(&input.address)?;
    let label = input.label.trim();
    if label.is_empty() {
        return Err(AppError::Validation("Wallet label is required".into()));
    }

    let wallet = db::wallet_queries::upsert(pool, &address, label).await?;
    info!("Watching wallet {} ({})", wallet.label, wallet.address);
    Ok(wallet)
}

pub async fn list_wallets(pool: &SqlitePool) -> Result<Vec<WatchedWallet>, AppError> {
    Ok(db::wallet_queries::fetch_all(pool).await?)
}

pub async fn remove_wallet(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    match db::wallet_queries::delete(pool, id).await? {
        0 => Err(AppError::NotFound(format!("Wallet {} not found", id))),
        _ => Ok(()),
    }
}

pub async fn wallet_transfers(
    pool: &SqlitePool,
    provider: Option<&dyn ChainHistoryProvider>,
    id: i64,
    limit: Option<u32>,
) -> Result<WalletTransfers, AppError> {
    let provider = provider.ok_or_else(|| {
        AppError::NotConfigured("Whale watcher requires ETHERSCAN_API_KEY".to_string())
    })?;

    let wallet = db::wallet_queries::fetch_one(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Wallet {} not found", id)))?;

    let transfers = provider
        .fetch_token_transfers(&wallet.address, clamp_limit(limit))
        .await?;

    Ok(WalletTransfers { wallet, transfers })
}
