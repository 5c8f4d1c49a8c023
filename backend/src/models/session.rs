use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::market::MarketOverview;
use crate::models::market_regime::RegimeView;
use crate::models::presentation::{Currency, Label, Terminology};
use crate::models::valuation::{PortfolioSnapshot, PortfolioSummaryView, SnapshotOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertCondition {
    Above,
    Below,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub asset: String,
    pub condition: AlertCondition,
    /// Threshold in USD.
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetPriceAlert {
    pub asset: String,
    pub condition: AlertCondition,
    /// Threshold in the session's display currency.
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlertCheck {
    Triggered { alert: PriceAlert, live_price: f64 },
    Pending { alert: PriceAlert, live_price: f64 },
    CheckFailed { alert: PriceAlert, reason: String },
}

/// Everything one dashboard user carries between renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    pub price_alert: Option<PriceAlert>,
    pub currency: Currency,
    pub terminology: Terminology,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            price_alert: None,
            currency: Currency::default(),
            terminology: Terminology::default(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePreferences {
    pub currency: Option<Currency>,
    pub terminology: Option<Terminology>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub session: SessionState,
    pub labels: std::collections::BTreeMap<Label, &'static str>,
    pub market: MarketOverview,
    pub regime: RegimeView,
    pub portfolio: PortfolioSummaryView,
    pub snapshot: SnapshotOutcome,
    pub history: Vec<PortfolioSnapshot>,
    pub alert: Option<AlertCheck>,
}
