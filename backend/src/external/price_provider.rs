use async_trait::async_trait;
use chrono::NaiveDate;

use crate::external::ProviderError;

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalPricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Source of daily close prices, keyed by exchange ticker (`BTC-USD`, `IDR=X`).
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Up to `days` most recent daily closes, oldest first.
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, ProviderError>;

    async fn fetch_latest_price(&self, ticker: &str) -> Result<f64, ProviderError> {
        let history = self.fetch_daily_history(ticker, 5).await?;
        history
            .last()
            .map(|p| p.close)
            .ok_or_else(|| ProviderError::NotFound(format!("no recent close for {}", ticker)))
    }
}

/// Yahoo-style USD pair for a crypto asset symbol.
pub fn usd_ticker(asset: &str) -> String {
    format!("{}-USD", asset.trim().to_uppercase())
}

pub const USD_IDR_TICKER: &str = "IDR=X";
