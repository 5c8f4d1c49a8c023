use std::collections::{BTreeMap, HashMap};

use futures::future::join_all;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::external::price_provider::{usd_ticker, PriceProvider};
use crate::models::{
    AllocationLine, AllocationPlan, AllocationRecommendation, AllocationRequest, AllocationStrategy,
    RegimeAssessment, RegimeLabel, ValuationSnapshot,
};
use crate::services::{indicators, market_regime_service, market_service, valuation_service};

const MAX_LOOKBACK_DAYS: u32 = 365;

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("No price history available for any candidate asset")]
    NoPriceData,
    #[error("No asset has a usable volatility over the lookback window")]
    NoQualifyingAssets,
    #[error("Portfolio is empty; nothing to allocate proportionally")]
    EmptyPortfolio,
    #[error("Market regime undetermined: {0}")]
    RegimeUndetermined(String),
}

fn normalize(scores: BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let total: f64 = scores.values().sum();
    scores.into_iter().map(|(asset, s)| (asset, s / total)).collect()
}

/// Weights proportional to the positive part of each asset's trailing return.
///
/// `histories` maps asset to daily closes, oldest first; only the last
/// `lookback + 1` closes are used. Assets without a full window are left
/// out. When every clipped return is zero the assets that do have a full
/// window share equally; assets missing from `histories` get nothing.
pub fn momentum_weights(
    histories: &BTreeMap<String, Vec<f64>>,
    lookback: usize,
) -> Result<BTreeMap<String, f64>, AllocationError> {
    let returns: BTreeMap<String, f64> = histories
        .iter()
        .filter(|(asset, closes)| {
            let full = closes.len() > lookback;
            if !full {
                warn!("Skipping {} for momentum: {} closes, need {}", asset, closes.len(), lookback + 1);
            }
            full
        })
        .filter_map(|(asset, closes)| {
            indicators::period_return(&closes[closes.len() - (lookback + 1)..])
                .filter(|r| r.is_finite())
                .map(|r| (asset.clone(), r.max(0.0)))
        })
        .collect();

    if returns.is_empty() {
        return Err(AllocationError::NoPriceData);
    }

    if returns.values().sum::<f64>() <= 0.0 {
        let equal = 1.0 / returns.len() as f64;
        return Ok(returns.into_keys().map(|asset| (asset, equal)).collect());
    }

    Ok(normalize(returns))
}

/// Inverse-volatility weights from the sample std of daily returns over the
/// last `lookback` closes.
pub fn risk_based_weights(
    histories: &BTreeMap<String, Vec<f64>>,
    lookback: usize,
) -> Result<BTreeMap<String, f64>, AllocationError> {
    if histories.values().all(|closes| closes.len() < 2) {
        return Err(AllocationError::NoPriceData);
    }

    let inverse_vol: BTreeMap<String, f64> = histories
        .iter()
        .filter_map(|(asset, closes)| {
            let start = closes.len().saturating_sub(lookback);
            let returns = indicators::daily_returns(&closes[start..]);
            match indicators::sample_std_dev(&returns) {
                Some(sigma) if sigma.is_finite() && sigma > 0.0 => Some((asset.clone(), 1.0 / sigma)),
                _ => {
                    warn!("Skipping {} for risk-based weights: no usable volatility", asset);
                    None
                }
            }
        })
        .collect();

    if inverse_vol.is_empty() {
        return Err(AllocationError::NoQualifyingAssets);
    }

    Ok(normalize(inverse_vol))
}

/// Current share of portfolio value per asset.
pub fn proportional_weights(valuation: &ValuationSnapshot) -> Result<BTreeMap<String, f64>, AllocationError> {
    if valuation.is_empty() || valuation.total_value <= 0.0 {
        return Err(AllocationError::EmptyPortfolio);
    }

    Ok(valuation
        .assets
        .iter()
        .map(|a| (a.asset.clone(), a.market_value / valuation.total_value))
        .collect())
}

/// Whole percentages that must add up to exactly 100; zero entries are dropped.
pub fn custom_weights(percentages: &HashMap<String, u32>) -> Result<BTreeMap<String, f64>, AllocationError> {
    let mut merged: BTreeMap<String, u32> = BTreeMap::new();
    for (raw, &pct) in percentages {
        let asset = raw.trim().to_uppercase();
        if asset.is_empty() {
            return Err(AllocationError::InvalidInput("Custom allocation has a blank asset".to_string()));
        }
        if merged.insert(asset.clone(), pct).is_some() {
            return Err(AllocationError::InvalidInput(format!(
                "Custom allocation lists {} more than once",
                asset
            )));
        }
    }

    let total: u64 = merged.values().map(|&p| u64::from(p)).sum();
    if total != 100 {
        return Err(AllocationError::InvalidInput(format!(
            "Custom allocation must total 100%, got {}%",
            total
        )));
    }

    Ok(merged
        .into_iter()
        .filter(|&(_, pct)| pct > 0)
        .map(|(asset, pct)| (asset, f64::from(pct) / 100.0))
        .collect())
}

/// Picks momentum for risk-on and risk-based for risk-off.
pub fn strategy_for_regime(assessment: &RegimeAssessment) -> Result<AllocationStrategy, AllocationError> {
    match assessment {
        RegimeAssessment::Determined { label: RegimeLabel::RiskOn, .. } => Ok(AllocationStrategy::Momentum),
        RegimeAssessment::Determined { label: RegimeLabel::RiskOff, .. } => Ok(AllocationStrategy::RiskBased),
        RegimeAssessment::Undetermined { reason } => Err(AllocationError::RegimeUndetermined(reason.clone())),
    }
}

/// Splits `new_funds_usd` by the plan's weights; `factor` converts USD into the display currency.
pub fn apply_to_funds(plan: &AllocationPlan, new_funds_usd: f64, factor: f64) -> Vec<AllocationLine> {
    plan.weights
        .iter()
        .map(|(asset, &weight)| {
            let amount_usd = new_funds_usd * weight;
            AllocationLine {
                asset: asset.clone(),
                weight,
                amount_usd,
                amount: amount_usd * factor,
            }
        })
        .collect()
}

fn candidate_assets(request: &AllocationRequest, config: &AppConfig) -> Result<Vec<String>, AllocationError> {
    let mut assets: Vec<String> = match &request.assets {
        Some(list) => list
            .iter()
            .map(|a| a.trim().to_uppercase())
            .filter(|a| !a.is_empty())
            .collect(),
        None => config.allocation_assets.clone(),
    };
    assets.sort();
    assets.dedup();

    if assets.is_empty() {
        return Err(AllocationError::InvalidInput("At least one asset is required".to_string()));
    }
    Ok(assets)
}

async fn fetch_histories(
    provider: &dyn PriceProvider,
    assets: &[String],
    points: u32,
) -> BTreeMap<String, Vec<f64>> {
    let fetches = assets.iter().map(|asset| async move {
        let ticker = usd_ticker(asset);
        (asset.clone(), provider.fetch_daily_history(&ticker, points).await)
    });

    join_all(fetches)
        .await
        .into_iter()
        .filter_map(|(asset, result)| match result {
            Ok(history) if !history.is_empty() => Some((asset, history.into_iter().map(|p| p.close).collect())),
            Ok(_) => {
                warn!("No price history returned for {}", asset);
                None
            }
            Err(e) => {
                warn!("Price history for {} unavailable: {}", asset, e);
                None
            }
        })
        .collect()
}

/// Computes the plan for `request` and splits its new funds.
pub async fn recommend(
    pool: &SqlitePool,
    provider: &dyn PriceProvider,
    config: &AppConfig,
    request: AllocationRequest,
) -> Result<AllocationRecommendation, AppError> {
    if !request.new_funds.is_finite() || request.new_funds <= 0.0 {
        return Err(AllocationError::InvalidInput("New funds must be greater than 0".to_string()).into());
    }
    let lookback = request.lookback_days.unwrap_or(config.lookback_days);
    if !(2..=MAX_LOOKBACK_DAYS).contains(&lookback) {
        return Err(AllocationError::InvalidInput(format!(
            "Lookback must be between 2 and {} days",
            MAX_LOOKBACK_DAYS
        ))
        .into());
    }

    let mut regime = None;
    let strategy = match request.strategy {
        AllocationStrategy::Automatic => {
            let assessment = market_regime_service::assess(provider, &config.regime_benchmark).await;
            let picked = strategy_for_regime(&assessment);
            regime = Some(market_regime_service::present(
                &config.regime_benchmark,
                assessment,
                request.terminology,
            ));
            picked?
        }
        other => other,
    };

    let weights = match strategy {
        AllocationStrategy::Momentum => {
            let assets = candidate_assets(&request, config)?;
            let histories = fetch_histories(provider, &assets, lookback + 1).await;
            momentum_weights(&histories, lookback as usize)?
        }
        AllocationStrategy::RiskBased => {
            let assets = candidate_assets(&request, config)?;
            let histories = fetch_histories(provider, &assets, lookback).await;
            risk_based_weights(&histories, lookback as usize)?
        }
        AllocationStrategy::Proportional => {
            let summary = valuation_service::portfolio_summary(pool, provider).await?;
            proportional_weights(&summary.valuation)?
        }
        AllocationStrategy::Custom => {
            let percentages = request.custom_percentages.as_ref().ok_or_else(|| {
                AllocationError::InvalidInput("Custom strategy requires custom_percentages".to_string())
            })?;
            custom_weights(percentages)?
        }
        AllocationStrategy::Automatic => {
            return Err(AppError::Unprocessable("Automatic strategy did not resolve".to_string()))
        }
    };

    let plan = AllocationPlan { strategy, weights };
    let rate = market_service::usd_idr_rate(provider, config.fallback_usd_idr_rate).await;
    let factor = market_service::conversion_factor(request.currency, &rate);
    let lines = apply_to_funds(&plan, request.new_funds / factor, factor);

    info!(
        "Allocation recommendation: {:?} across {} assets",
        plan.strategy,
        lines.len()
    );

    Ok(AllocationRecommendation {
        strategy: plan.strategy,
        currency: request.currency,
        new_funds: request.new_funds,
        lines,
        regime,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetValuation;

    fn closes_with_return(r: f64, n: usize) -> Vec<f64> {
        // flat start so that only first and last matter
        let mut closes = vec![100.0; n];
        if let Some(last) = closes.last_mut() {
            *last = 100.0 * (1.0 + r);
        }
        closes
    }

    fn sum(weights: &BTreeMap<String, f64>) -> f64 {
        weights.values().sum()
    }

    #[test]
    fn test_momentum_positive_return_takes_all() {
        let mut histories = BTreeMap::new();
        histories.insert("BTC".to_string(), closes_with_return(0.10, 31));
        histories.insert("ETH".to_string(), closes_with_return(-0.05, 31));
        histories.insert("SOL".to_string(), closes_with_return(0.0, 31));

        let w = momentum_weights(&histories, 30).unwrap();
        assert!((w["BTC"] - 1.0).abs() < 1e-12);
        assert_eq!(w["ETH"], 0.0);
        assert_eq!(w["SOL"], 0.0);
    }

    #[test]
    fn test_momentum_all_zero_is_equal_weight() {
        let histories: BTreeMap<String, Vec<f64>> = ["BTC", "ETH", "SOL"]
            .iter()
            .map(|a| (a.to_string(), closes_with_return(0.0, 31)))
            .collect();

        let w = momentum_weights(&histories, 30).unwrap();
        for asset in ["BTC", "ETH", "SOL"] {
            assert!((w[asset] - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_momentum_weights_sum_to_one() {
        let mut histories = BTreeMap::new();
        histories.insert("BTC".to_string(), closes_with_return(0.07, 31));
        histories.insert("ETH".to_string(), closes_with_return(0.13, 31));
        histories.insert("SOL".to_string(), closes_with_return(0.021, 31));

        let w = momentum_weights(&histories, 30).unwrap();
        assert!((sum(&w) - 1.0).abs() < 1e-9);
        assert!(w["ETH"] > w["BTC"] && w["BTC"] > w["SOL"]);
    }

    #[test]
    fn test_momentum_uses_only_lookback_window() {
        // big dip before the window; BTC's window return is what counts
        let mut btc = vec![10.0; 10];
        btc.extend(closes_with_return(0.05, 31));
        let mut histories = BTreeMap::new();
        histories.insert("BTC".to_string(), btc);
        histories.insert("ETH".to_string(), closes_with_return(0.05, 31));

        let w = momentum_weights(&histories, 30).unwrap();
        assert!((w["BTC"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_momentum_without_history_is_unavailable() {
        let mut histories = BTreeMap::new();
        assert!(matches!(momentum_weights(&histories, 30), Err(AllocationError::NoPriceData)));
        histories.insert("BTC".to_string(), vec![100.0]);
        assert!(matches!(momentum_weights(&histories, 30), Err(AllocationError::NoPriceData)));
    }

    #[test]
    fn test_risk_based_inverse_volatility() {
        let mut histories = BTreeMap::new();
        // ETH swings twice as hard as BTC
        histories.insert("BTC".to_string(), vec![100.0, 101.0, 100.0, 101.0, 100.0]);
        histories.insert("ETH".to_string(), vec![100.0, 102.0, 100.0, 102.0, 100.0]);

        let w = risk_based_weights(&histories, 30).unwrap();
        assert!((sum(&w) - 1.0).abs() < 1e-9);
        assert!(w["BTC"] > w["ETH"]);
        assert!((w["BTC"] / w["ETH"] - 2.0).abs() < 0.05);
    }

    #[test]
    fn test_risk_based_skips_flat_assets() {
        let mut histories = BTreeMap::new();
        histories.insert("USDT".to_string(), vec![1.0; 10]);
        histories.insert("BTC".to_string(), vec![100.0, 103.0, 99.0, 104.0]);

        let w = risk_based_weights(&histories, 30).unwrap();
        assert_eq!(w.len(), 1);
        assert!((w["BTC"] - 1.0).abs() < 1e-12);

        histories.remove("BTC");
        assert!(matches!(risk_based_weights(&histories, 30), Err(AllocationError::NoQualifyingAssets)));
    }

    #[test]
    fn test_proportional_uses_current_shares() {
        let valuation = ValuationSnapshot {
            assets: vec![
                AssetValuation {
                    asset: "BTC".to_string(),
                    quantity: 1.0,
                    unit_price: 60000.0,
                    market_value: 60000.0,
                    allocation_pct: 75.0,
                },
                AssetValuation {
                    asset: "ETH".to_string(),
                    quantity: 10.0,
                    unit_price: 2000.0,
                    market_value: 20000.0,
                    allocation_pct: 25.0,
                },
            ],
            total_value: 80000.0,
            failed_assets: vec![],
        };

        let w = proportional_weights(&valuation).unwrap();
        assert!((w["BTC"] - 0.75).abs() < 1e-12);
        assert!((w["ETH"] - 0.25).abs() < 1e-12);
        assert!(matches!(
            proportional_weights(&ValuationSnapshot::default()),
            Err(AllocationError::EmptyPortfolio)
        ));
    }

    #[test]
    fn test_custom_must_total_exactly_100() {
        let mut pct = HashMap::new();
        pct.insert("BTC".to_string(), 60);
        pct.insert("ETH".to_string(), 40);
        pct.insert("SOL".to_string(), 0);

        let w = custom_weights(&pct).unwrap();
        assert_eq!(w.len(), 2);
        assert!((w["BTC"] - 0.6).abs() < 1e-12);

        pct.insert("SOL".to_string(), 1);
        let err = custom_weights(&pct).unwrap_err();
        assert!(matches!(err, AllocationError::InvalidInput(_)));
        assert!(err.to_string().contains("101"));

        let mut short = HashMap::new();
        short.insert("BTC".to_string(), 99);
        assert!(custom_weights(&short).is_err());
    }

    #[test]
    fn test_custom_rejects_same_asset_spelled_twice() {
        let mut pct = HashMap::new();
        pct.insert("btc".to_string(), 50);
        pct.insert(" BTC".to_string(), 50);

        let err = custom_weights(&pct).unwrap_err();
        assert!(matches!(err, AllocationError::InvalidInput(_)));
        assert!(err.to_string().contains("BTC"));
    }

    #[test]
    fn test_custom_rejects_blank_asset() {
        let mut pct = HashMap::new();
        pct.insert("  ".to_string(), 100);
        assert!(matches!(custom_weights(&pct), Err(AllocationError::InvalidInput(_))));

        let mut pct = HashMap::new();
        pct.insert(" eth ".to_string(), 100);
        let w = custom_weights(&pct).unwrap();
        assert_eq!(w.keys().collect::<Vec<_>>(), vec!["ETH"]);
        assert!((sum(&w) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_momentum_skips_assets_without_full_window() {
        let mut histories = BTreeMap::new();
        histories.insert("BTC".to_string(), closes_with_return(0.10, 31));
        histories.insert("NEW".to_string(), closes_with_return(0.50, 3));

        let w = momentum_weights(&histories, 30).unwrap();
        assert_eq!(w.len(), 1);
        assert!((w["BTC"] - 1.0).abs() < 1e-12);

        histories.remove("BTC");
        assert!(matches!(momentum_weights(&histories, 30), Err(AllocationError::NoPriceData)));
    }

    #[test]
    fn test_strategy_for_regime() {
        let on = RegimeAssessment::Determined {
            label: RegimeLabel::RiskOn,
            current_price: 2.0,
            moving_average: 1.0,
        };
        let off = RegimeAssessment::Determined {
            label: RegimeLabel::RiskOff,
            current_price: 1.0,
            moving_average: 2.0,
        };
        let unknown = RegimeAssessment::Undetermined {
            reason: "history unavailable".to_string(),
        };

        assert_eq!(strategy_for_regime(&on).unwrap(), AllocationStrategy::Momentum);
        assert_eq!(strategy_for_regime(&off).unwrap(), AllocationStrategy::RiskBased);
        assert!(matches!(
            strategy_for_regime(&unknown),
            Err(AllocationError::RegimeUndetermined(reason)) if reason == "history unavailable"
        ));
    }

    #[test]
    fn test_apply_to_funds_converts_currency() {
        let mut weights = BTreeMap::new();
        weights.insert("BTC".to_string(), 0.5);
        weights.insert("ETH".to_string(), 0.5);
        let plan = AllocationPlan {
            strategy: AllocationStrategy::Custom,
            weights,
        };

        let lines = apply_to_funds(&plan, 100.0, 16000.0);
        assert_eq!(lines[0].asset, "BTC");
        assert_eq!(lines[0].amount_usd, 50.0);
        assert_eq!(lines[0].amount, 800000.0);
    }
}
