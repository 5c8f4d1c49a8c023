use std::net::SocketAddr;
use std::time::Duration;

use crate::errors::ConfigError;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub http_timeout: Duration,
    pub llm_enabled: bool,
    pub gemini_api_key: Option<String>,
    pub llm_model: String,
    pub etherscan_api_key: Option<String>,
    pub fallback_usd_idr_rate: f64,
    pub allocation_assets: Vec<String>,
    pub lookback_days: u32,
    pub regime_benchmark: String,
    pub snapshot_cron: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid { name: "BIND_ADDR", reason: e.to_string() })?;

        let http_timeout_secs = parse_var("HTTP_TIMEOUT_SECS", 15u64)?;
        let fallback_usd_idr_rate = parse_var("FALLBACK_USD_IDR_RATE", 16200.0f64)?;
        let lookback_days = parse_var("ALLOCATION_LOOKBACK_DAYS", 30u32)?;
        let llm_enabled = parse_var("LLM_ENABLED", true)?;

        let allocation_assets = std::env::var("ALLOCATION_ASSETS")
            .map(|raw| parse_asset_list(&raw))
            .unwrap_or_else(|_| default_allocation_assets());

        let config = Self {
            database_url,
            bind_addr,
            http_timeout: Duration::from_secs(http_timeout_secs),
            llm_enabled,
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            etherscan_api_key: non_empty_var("ETHERSCAN_API_KEY"),
            fallback_usd_idr_rate,
            allocation_assets,
            lookback_days,
            regime_benchmark: std::env::var("REGIME_BENCHMARK").unwrap_or_else(|_| "BTC".to_string()),
            snapshot_cron: std::env::var("SNAPSHOT_CRON").unwrap_or_else(|_| "0 55 23 * * *".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_enabled && self.gemini_api_key.is_none() {
            return Err(ConfigError::Invalid {
                name: "GEMINI_API_KEY",
                reason: "required while LLM_ENABLED is true".to_string(),
            });
        }
        if self.allocation_assets.is_empty() {
            return Err(ConfigError::Invalid {
                name: "ALLOCATION_ASSETS",
                reason: "at least one asset is required".to_string(),
            });
        }
        if self.lookback_days < 2 {
            return Err(ConfigError::Invalid {
                name: "ALLOCATION_LOOKBACK_DAYS",
                reason: "must be at least 2".to_string(),
            });
        }
        if !(self.fallback_usd_idr_rate.is_finite() && self.fallback_usd_idr_rate > 0.0) {
            return Err(ConfigError::Invalid {
                name: "FALLBACK_USD_IDR_RATE",
                reason: "must be a positive number".to_string(),
            });
        }
        Ok(())
    }
}

pub fn default_allocation_assets() -> Vec<String> {
    vec!["BTC".to_string(), "ETH".to_string(), "SOL".to_string()]
}

/// Splits a comma separated list like `btc, eth,SOL` into upper-case symbols.
pub fn parse_asset_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::Invalid { name, reason: e.to_string() }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            http_timeout: Duration::from_secs(15),
            llm_enabled: false,
            gemini_api_key: None,
            llm_model: "gemini-1.5-flash".to_string(),
            etherscan_api_key: None,
            fallback_usd_idr_rate: 16200.0,
            allocation_assets: default_allocation_assets(),
            lookback_days: 30,
            regime_benchmark: "BTC".to_string(),
            snapshot_cron: "0 55 23 * * *".to_string(),
        }
    }

    #[test]
    fn test_parse_asset_list_normalizes() {
        assert_eq!(parse_asset_list(" btc, eth,,SOL "), vec!["BTC", "ETH", "SOL"]);
        assert!(parse_asset_list(" , ").is_empty());
    }

    #[test]
    fn test_llm_enabled_requires_key() {
        let mut config = base_config();
        config.llm_enabled = true;
        assert!(config.validate().is_err());

        config.gemini_api_key = Some("key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_asset_list_and_bad_rate() {
        let mut config = base_config();
        config.allocation_assets.clear();
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.fallback_usd_idr_rate = 0.0;
        assert!(config.validate().is_err());
    }
}
