use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::presentation::Currency;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetValuation {
    pub asset: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub market_value: f64,
    /// Share of the valued total, 0..=100.
    pub allocation_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedAsset {
    pub asset: String,
    pub reason: String,
}

/// Portfolio priced at live unit prices. Assets whose price lookup failed are
/// listed in `failed_assets` and contribute nothing to `total_value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationSnapshot {
    pub assets: Vec<AssetValuation>,
    pub total_value: f64,
    pub failed_assets: Vec<FailedAsset>,
}

impl ValuationSnapshot {
    pub fn is_complete(&self) -> bool {
        self.failed_assets.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    pub valuation: ValuationSnapshot,
    pub total_deposits: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
}

/// Summary converted into the caller's display currency.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummaryView {
    pub currency: Currency,
    pub exchange_rate: f64,
    pub total_value: f64,
    pub total_deposits: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub assets: Vec<AssetValuation>,
    pub failed_assets: Vec<FailedAsset>,
}

impl PortfolioSummaryView {
    pub fn new(summary: &PortfolioSummary, currency: Currency, exchange_rate: f64) -> Self {
        let assets = summary
            .valuation
            .assets
            .iter()
            .map(|a| AssetValuation {
                asset: a.asset.clone(),
                quantity: a.quantity,
                unit_price: a.unit_price * exchange_rate,
                market_value: a.market_value * exchange_rate,
                allocation_pct: a.allocation_pct,
            })
            .collect();

        Self {
            currency,
            exchange_rate,
            total_value: summary.valuation.total_value * exchange_rate,
            total_deposits: summary.total_deposits * exchange_rate,
            profit_loss: summary.profit_loss * exchange_rate,
            profit_loss_pct: summary.profit_loss_pct,
            assets,
            failed_assets: summary.valuation.failed_assets.clone(),
        }
    }
}

// One point of the daily portfolio value chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PortfolioSnapshot {
    pub snapshot_date: NaiveDate,
    pub total_value_usd: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotOutcome {
    pub snapshot_date: NaiveDate,
    pub recorded: bool,
    pub reason: Option<String>,
}
