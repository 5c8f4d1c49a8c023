use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::market_regime::RegimeView;
use crate::models::presentation::{Currency, Terminology};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStrategy {
    /// Picks momentum or risk-based from the market regime.
    Automatic,
    Momentum,
    RiskBased,
    Proportional,
    Custom,
}

/// Asset weights in [0, 1] summing to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub strategy: AllocationStrategy,
    pub weights: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllocationRequest {
    pub strategy: AllocationStrategy,
    /// New money to split, in `currency`.
    pub new_funds: f64,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub assets: Option<Vec<String>>,
    #[serde(default)]
    pub lookback_days: Option<u32>,
    /// Whole percentages per asset, only read by the custom strategy.
    #[serde(default)]
    pub custom_percentages: Option<HashMap<String, u32>>,
    #[serde(default)]
    pub terminology: Terminology,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationLine {
    pub asset: String,
    pub weight: f64,
    pub amount_usd: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationRecommendation {
    /// Strategy that produced the weights; differs from the request for automatic.
    pub strategy: AllocationStrategy,
    pub currency: Currency,
    pub new_funds: f64,
    pub lines: Vec<AllocationLine>,
    pub regime: Option<RegimeView>,
}
