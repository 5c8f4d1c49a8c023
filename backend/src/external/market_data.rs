use async_trait::async_trait;
use serde::Deserialize;

use crate::external::ProviderError;
use crate::models::SentimentIndex;

const FEAR_GREED_URL: &str = "https://api.alternative.me/fng/?limit=1";
const COINGECKO_GLOBAL_URL: &str = "https://api.coingecko.com/api/v3/global";

/// Market-wide crypto indicators.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_fear_greed(&self) -> Result<SentimentIndex, ProviderError>;

    /// BTC share of total crypto market cap, in percent.
    async fn fetch_btc_dominance(&self) -> Result<f64, ProviderError>;
}

/// alternative.me for the fear & greed index, CoinGecko for dominance.
pub struct PublicMarketDataProvider {
    client: reqwest::Client,
}

impl PublicMarketDataProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ProviderError> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::BadResponse(format!("HTTP {} from {}", status, url)));
        }

        resp.json::<T>().await.map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct FearGreedResponse {
    data: Vec<FearGreedEntry>,
}

#[derive(Debug, Deserialize)]
struct FearGreedEntry {
    value: String,
    value_classification: String,
}

#[derive(Debug, Deserialize)]
struct GlobalResponse {
    data: GlobalData,
}

#[derive(Debug, Deserialize)]
struct GlobalData {
    market_cap_percentage: std::collections::HashMap<String, f64>,
}

fn parse_fear_greed(body: FearGreedResponse) -> Result<SentimentIndex, ProviderError> {
    let entry = body
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::BadResponse("empty fear & greed data".into()))?;

    let value = entry
        .value
        .trim()
        .parse::<f64>()
        .map_err(|e| ProviderError::Parse(format!("fear & greed value '{}': {}", entry.value, e)))?;

    Ok(SentimentIndex {
        value: value.clamp(0.0, 100.0) as u8,
        classification: entry.value_classification,
    })
}

fn parse_dominance(body: GlobalResponse) -> Result<f64, ProviderError> {
    body.data
        .market_cap_percentage
        .get("btc")
        .copied()
        .ok_or_else(|| ProviderError::BadResponse("missing btc market cap percentage".into()))
}

#[async_trait]
impl MarketDataProvider for PublicMarketDataProvider {
    async fn fetch_fear_greed(&self) -> Result<SentimentIndex, ProviderError> {
        let body: FearGreedResponse = self.get_json(FEAR_GREED_URL).await?;
        parse_fear_greed(body)
    }

    async fn fetch_btc_dominance(&self) -> Result<f64, ProviderError> {
        let body: GlobalResponse = self.get_json(COINGECKO_GLOBAL_URL).await?;
        parse_dominance(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fear_greed() {
        let body: FearGreedResponse = serde_json::from_str(
            r#"{"name":"Fear and Greed Index","data":[{"value":"72","value_classification":"Greed","timestamp":"1704067200"}]}"#,
        )
        .unwrap();

        let index = parse_fear_greed(body).unwrap();
        assert_eq!(index.value, 72);
        assert_eq!(index.classification, "Greed");
    }

    #[test]
    fn test_parse_fear_greed_empty_is_error() {
        let body: FearGreedResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(parse_fear_greed(body).is_err());
    }

    #[test]
    fn test_parse_dominance() {
        let body: GlobalResponse = serde_json::from_str(
            r#"{"data":{"active_cryptocurrencies":1,"market_cap_percentage":{"btc":52.31,"eth":16.9}}}"#,
        )
        .unwrap();
        assert_eq!(parse_dominance(body).unwrap(), 52.31);
    }
}
