use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::warn;

use crate::external::ProviderError;
use crate::models::{TokenTransfer, TransferDirection};

const ETHERSCAN_URL: &str = "https://api.etherscan.io/v2/api";
const ETHEREUM_MAINNET: u32 = 1;
const DEFAULT_TOKEN_DECIMALS: i32 = 18;

/// On-chain token transfer history for an address.
#[async_trait]
pub trait ChainHistoryProvider: Send + Sync {
    /// Most recent ERC-20 transfers touching `address`, newest first.
    async fn fetch_token_transfers(
        &self,
        address: &str,
        limit: u32,
    ) -> Result<Vec<TokenTransfer>, ProviderError>;
}

pub struct EtherscanProvider {
    client: reqwest::Client,
    api_key: String,
}

impl EtherscanProvider {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    message: String,
    // array of transfers on success, error text otherwise
    result: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenTransfer {
    #[serde(default)]
    time_stamp: String,
    #[serde(default)]
    hash: String,
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    token_symbol: String,
    #[serde(default)]
    token_decimal: String,
}

fn decimal_adjusted(raw_value: &str, raw_decimals: &str) -> f64 {
    let value = raw_value.trim().parse::<f64>().unwrap_or(0.0);
    let decimals = raw_decimals.trim().parse::<i32>().unwrap_or(DEFAULT_TOKEN_DECIMALS);
    if decimals > 0 {
        value / 10f64.powi(decimals)
    } else {
        value
    }
}

fn normalize(address: &str, raw: RawTokenTransfer) -> Option<TokenTransfer> {
    let Some(timestamp) = raw
        .time_stamp
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
    else {
        warn!("Skipping transfer {} with unreadable timestamp '{}'", raw.hash, raw.time_stamp);
        return None;
    };

    let direction = if raw.from.eq_ignore_ascii_case(address) {
        TransferDirection::Out
    } else {
        TransferDirection::In
    };

    Some(TokenTransfer {
        timestamp,
        direction,
        amount: decimal_adjusted(&raw.value, &raw.token_decimal),
        token_symbol: raw.token_symbol,
        to: raw.to,
        from: raw.from,
        tx_hash: raw.hash,
    })
}

fn parse_response(address: &str, body: EtherscanResponse) -> Result<Vec<TokenTransfer>, ProviderError> {
    if body.status != "1" {
        if body.message.starts_with("No transactions found") {
            return Ok(Vec::new());
        }
        let detail = body.result.as_str().unwrap_or_default();
        return Err(if detail.to_lowercase().contains("rate limit") {
            ProviderError::RateLimited
        } else {
            ProviderError::BadResponse(format!("{} {}", body.message, detail).trim().to_string())
        });
    }

    let rows: Vec<RawTokenTransfer> =
        serde_json::from_value(body.result).map_err(|e| ProviderError::Parse(e.to_string()))?;

    Ok(rows.into_iter().filter_map(|raw| normalize(address, raw)).collect())
}

#[async_trait]
impl ChainHistoryProvider for EtherscanProvider {
    async fn fetch_token_transfers(
        &self,
        address: &str,
        limit: u32,
    ) -> Result<Vec<TokenTransfer>, ProviderError> {
        let chain_id = ETHEREUM_MAINNET.to_string();
        let offset = limit.to_string();
        let resp = self
            .client
            .get(ETHERSCAN_URL)
            .query(&[
                ("chainid", chain_id.as_str()),
                ("module", "account"),
                ("action", "tokentx"),
                ("address", address),
                ("page", "1"),
                ("offset", offset.as_str()),
                ("sort", "desc"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ProviderError::BadResponse(format!("HTTP {}", resp.status())));
        }

        let body = resp
            .json::<EtherscanResponse>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parse_response(address, body)
    }
}
