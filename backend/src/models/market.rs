use serde::{Deserialize, Serialize};

pub const UNAVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentIndex {
    /// 0 (extreme fear) to 100 (extreme greed).
    pub value: u8,
    pub classification: String,
}

impl SentimentIndex {
    pub fn display(&self) -> String {
        format!("{} ({})", self.value, self.classification)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub usd_to_idr: f64,
    /// True when the live lookup failed and the configured rate was used.
    pub is_fallback: bool,
}

// Each indicator is fetched independently; `None` means the source was unavailable.
#[derive(Debug, Clone, Serialize)]
pub struct MarketOverview {
    pub fear_greed: Option<SentimentIndex>,
    pub fear_greed_display: String,
    pub btc_dominance: Option<f64>,
    pub btc_dominance_display: String,
    pub exchange_rate: ExchangeRate,
}

impl MarketOverview {
    pub fn new(
        fear_greed: Option<SentimentIndex>,
        btc_dominance: Option<f64>,
        exchange_rate: ExchangeRate,
    ) -> Self {
        let fear_greed_display = fear_greed
            .as_ref()
            .map(SentimentIndex::display)
            .unwrap_or_else(|| UNAVAILABLE.to_string());
        let btc_dominance_display = btc_dominance
            .map(|d| format!("{:.2}%", d))
            .unwrap_or_else(|| UNAVAILABLE.to_string());

        Self {
            fear_greed,
            fear_greed_display,
            btc_dominance,
            btc_dominance_display,
            exchange_rate,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResearchRequest {
    pub topic: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchResponse {
    pub topic: String,
    pub date: String,
    pub analysis: String,
}
