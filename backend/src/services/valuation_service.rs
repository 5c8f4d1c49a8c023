use chrono::NaiveDate;
use futures::future::join_all;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db;
use crate::errors::AppError;
use crate::external::price_provider::{usd_ticker, PriceProvider};
use crate::external::ProviderError;
use crate::models::{
    AssetValuation, FailedAsset, PortfolioSummary, Position, SnapshotOutcome, ValuationSnapshot,
};
use crate::services::position_service;

/// Prices each position independently; failed lookups land in `failed_assets`
/// and are left out of the total.
pub fn build_snapshot(
    positions: &[Position],
    prices: Vec<Result<f64, ProviderError>>,
) -> ValuationSnapshot {
    let mut assets = Vec::new();
    let mut failed_assets = Vec::new();

    for (position, price) in positions.iter().zip(prices) {
        match price {
            Ok(unit_price) if unit_price.is_finite() && unit_price >= 0.0 => assets.push(AssetValuation {
                asset: position.asset.clone(),
                quantity: position.net_quantity,
                unit_price,
                market_value: position.net_quantity * unit_price,
                allocation_pct: 0.0,
            }),
            Ok(unit_price) => failed_assets.push(FailedAsset {
                asset: position.asset.clone(),
                reason: format!("Invalid price {}", unit_price),
            }),
            Err(e) => failed_assets.push(FailedAsset {
                asset: position.asset.clone(),
                reason: e.to_string(),
            }),
        }
    }

    let total_value: f64 = assets.iter().map(|a| a.market_value).sum();
    if total_value > 0.0 {
        for a in assets.iter_mut() {
            a.allocation_pct = a.market_value / total_value * 100.0;
        }
    }

    ValuationSnapshot {
        assets,
        total_value,
        failed_assets,
    }
}

pub async fn value_positions(provider: &dyn PriceProvider, positions: &[Position]) -> ValuationSnapshot {
    let lookups = positions.iter().map(|p| {
        let ticker = usd_ticker(&p.asset);
        async move { provider.fetch_latest_price(&ticker).await }
    });
    let prices = join_all(lookups).await;

    let snapshot = build_snapshot(positions, prices);
    for failed in &snapshot.failed_assets {
        warn!("Could not price {}: {}", failed.asset, failed.reason);
    }
    snapshot
}

pub fn summarize(valuation: ValuationSnapshot, total_deposits: f64) -> PortfolioSummary {
    let profit_loss = valuation.total_value - total_deposits;
    let profit_loss_pct = if total_deposits > 0.0 {
        profit_loss / total_deposits * 100.0
    } else {
        0.0
    };

    PortfolioSummary {
        valuation,
        total_deposits,
        profit_loss,
        profit_loss_pct,
    }
}

/// Values the stored portfolio at live prices.
pub async fn portfolio_summary(
    pool: &SqlitePool,
    provider: &dyn PriceProvider,
) -> Result<PortfolioSummary, AppError> {
    let current = position_service::current_positions(pool).await?;
    let valuation = value_positions(provider, &current.positions).await;
    Ok(summarize(valuation, current.total_deposits))
}

/// Stores the day's value unless the valuation is empty or partial, or the
/// date already has a snapshot.
pub async fn record_daily_snapshot(
    pool: &SqlitePool,
    date: NaiveDate,
    valuation: &ValuationSnapshot,
) -> Result<SnapshotOutcome, AppError> {
    let skipped = |reason: String| SnapshotOutcome {
        snapshot_date: date,
        recorded: false,
        reason: Some(reason),
    };

    if !valuation.is_complete() {
        let names: Vec<&str> = valuation.failed_assets.iter().map(|f| f.asset.as_str()).collect();
        return Ok(skipped(format!("Prices unavailable for {}", names.join(", "))));
    }
    if valuation.total_value <= 0.0 {
        return Ok(skipped("Portfolio has no value to record".to_string()));
    }

    let recorded = db::snapshot_queries::insert_if_absent(pool, date, valuation.total_value).await?;
    if recorded {
        info!("Recorded portfolio snapshot for {}: {:.2} USD", date, valuation.total_value);
        Ok(SnapshotOutcome {
            snapshot_date: date,
            recorded: true,
            reason: None,
        })
    } else {
        Ok(skipped("Snapshot for this date already exists".to_string()))
    }
}
