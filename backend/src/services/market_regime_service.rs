use tracing::{info, warn};

use crate::external::price_provider::{usd_ticker, PriceProvider};
use crate::models::{RegimeAssessment, RegimeLabel, RegimeView, Terminology};
use crate::services::indicators;

pub const REGIME_SMA_WINDOW: usize = 200;
/// Calendar days requested so that at least 200 daily closes come back.
pub const REGIME_FETCH_DAYS: u32 = 250;

/// Classifies the trend of `closes` (oldest first) against its 200-period SMA.
///
/// Strictly above the average is risk-on; equal or below is risk-off.
pub fn classify(closes: &[f64]) -> RegimeAssessment {
    if closes.len() < REGIME_SMA_WINDOW {
        return RegimeAssessment::Undetermined {
            reason: format!(
                "Need at least {} daily closes, got {}",
                REGIME_SMA_WINDOW,
                closes.len()
            ),
        };
    }

    let moving_average = indicators::sma(closes, REGIME_SMA_WINDOW).last().copied().flatten();
    let (Some(moving_average), Some(&current_price)) = (moving_average, closes.last()) else {
        return RegimeAssessment::Undetermined {
            reason: "Moving average could not be computed".to_string(),
        };
    };

    let label = if current_price > moving_average {
        RegimeLabel::RiskOn
    } else {
        RegimeLabel::RiskOff
    };

    RegimeAssessment::Determined {
        label,
        current_price,
        moving_average,
    }
}

/// Fetches the benchmark history and classifies it. Fetch failures become
/// [`RegimeAssessment::Undetermined`] instead of errors.
pub async fn assess(provider: &dyn PriceProvider, benchmark: &str) -> RegimeAssessment {
    let ticker = usd_ticker(benchmark);
    match provider.fetch_daily_history(&ticker, REGIME_FETCH_DAYS).await {
        Ok(history) => {
            let closes: Vec<f64> = history.iter().map(|p| p.close).collect();
            let assessment = classify(&closes);
            info!("Market regime for {}: {:?}", benchmark, assessment.label());
            assessment
        }
        Err(e) => {
            warn!("Failed to fetch {} history for regime: {}", ticker, e);
            RegimeAssessment::Undetermined {
                reason: format!("Price history for {} unavailable: {}", benchmark, e),
            }
        }
    }
}

pub fn present(benchmark: &str, assessment: RegimeAssessment, terminology: Terminology) -> RegimeView {
    let (display, reason) = match &assessment {
        RegimeAssessment::Determined {
            label,
            current_price,
            moving_average,
        } => (
            terminology.regime_text(*label).to_string(),
            terminology.regime_reason(benchmark, *label, *current_price, *moving_average),
        ),
        RegimeAssessment::Undetermined { reason } => ("Undetermined".to_string(), reason.clone()),
    };

    RegimeView {
        benchmark: benchmark.to_string(),
        assessment,
        display,
        reason,
    }
}
