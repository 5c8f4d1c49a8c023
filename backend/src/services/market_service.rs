use tracing::warn;

use crate::external::market_data::MarketDataProvider;
use crate::external::price_provider::{PriceProvider, USD_IDR_TICKER};
use crate::models::{Currency, ExchangeRate, MarketOverview};

/// Live USD→IDR rate, or `fallback_rate` flagged as such when the lookup fails.
pub async fn usd_idr_rate(provider: &dyn PriceProvider, fallback_rate: f64) -> ExchangeRate {
    match provider.fetch_latest_price(USD_IDR_TICKER).await {
        Ok(rate) if rate.is_finite() && rate > 0.0 => ExchangeRate {
            usd_to_idr: rate,
            is_fallback: false,
        },
        Ok(rate) => {
            warn!("Ignoring implausible USD/IDR rate {}; using fallback {}", rate, fallback_rate);
            ExchangeRate {
                usd_to_idr: fallback_rate,
                is_fallback: true,
            }
        }
        Err(e) => {
            warn!("USD/IDR lookup failed: {}; using fallback {}", e, fallback_rate);
            ExchangeRate {
                usd_to_idr: fallback_rate,
                is_fallback: true,
            }
        }
    }
}

/// Multiplier from USD into `currency`.
pub fn conversion_factor(currency: Currency, rate: &ExchangeRate) -> f64 {
    match currency {
        Currency::Usd => 1.0,
        Currency::Idr => rate.usd_to_idr,
    }
}

/// Fetches the three indicators concurrently; each degrades to its sentinel alone.
pub async fn overview(
    market: &dyn MarketDataProvider,
    prices: &dyn PriceProvider,
    fallback_rate: f64,
) -> MarketOverview {
    let (fear_greed, dominance, rate) = tokio::join!(
        market.fetch_fear_greed(),
        market.fetch_btc_dominance(),
        usd_idr_rate(prices, fallback_rate),
    );

    let fear_greed = fear_greed
        .map_err(|e| warn!("Fear & greed index unavailable: {}", e))
        .ok();
    let dominance = dominance
        .map_err(|e| warn!("BTC dominance unavailable: {}", e))
        .ok();

    MarketOverview::new(fear_greed, dominance, rate)
}
