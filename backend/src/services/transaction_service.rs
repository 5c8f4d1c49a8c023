use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::db;
use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::{CreateTransaction, Currency, NewTransaction, Transaction};
use crate::services::market_service;

/// Checks the input and converts its unit price into USD.
///
/// `factor` is the USD→`input.currency` multiplier (1.0 for USD).
pub fn validate(input: CreateTransaction, factor: f64) -> Result<NewTransaction, AppError> {
    let asset = input.asset.trim().to_uppercase();
    if asset.is_empty() {
        return Err(AppError::Validation("Asset cannot be empty".into()));
    }
    if !input.quantity.is_finite() || input.quantity <= 0.0 {
        return Err(AppError::Validation("Quantity must be > 0".into()));
    }
    if !input.unit_price.is_finite() || input.unit_price < 0.0 {
        return Err(AppError::Validation("Unit price cannot be negative".into()));
    }
    if !factor.is_finite() || factor <= 0.0 {
        return Err(AppError::Validation("Exchange rate must be > 0".into()));
    }

    Ok(NewTransaction {
        asset,
        tx_type: input.tx_type,
        quantity: input.quantity,
        price_usd: input.unit_price / factor,
        timestamp: input.timestamp.unwrap_or_else(Utc::now),
    })
}

pub async fn create(
    pool: &SqlitePool,
    provider: &dyn PriceProvider,
    fallback_rate: f64,
    input: CreateTransaction,
) -> Result<Transaction, AppError> {
    let factor = match input.currency {
        Currency::Usd => 1.0,
        Currency::Idr => market_service::usd_idr_rate(provider, fallback_rate).await.usd_to_idr,
    };
    let new_tx = validate(input, factor)?;

    match db::transaction_queries::create(pool, &new_tx).await {
        Ok(tx) => {
            info!("Recorded {:?} {} {} @ {:.2} USD", tx.tx_type, tx.quantity, tx.asset, tx.price);
            Ok(tx)
        }
        Err(e) => {
            error!("Failed to record transaction for {}: {:?}", new_tx.asset, e);
            Err(AppError::Db(e))
        }
    }
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Transaction>, AppError> {
    Ok(db::transaction_queries::fetch_all(pool).await?)
}
