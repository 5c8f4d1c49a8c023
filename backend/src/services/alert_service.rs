use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::price_provider::{usd_ticker, PriceProvider};
use crate::models::{AlertCheck, AlertCondition, PriceAlert, SessionState, SetPriceAlert};

/// Builds a USD alert from a threshold given in the display currency.
pub fn from_display(input: SetPriceAlert, factor: f64) -> Result<PriceAlert, AppError> {
    let asset = input.asset.trim().to_uppercase();
    if asset.is_empty() {
        return Err(AppError::Validation("Alert asset cannot be empty".into()));
    }
    if !input.price.is_finite() || input.price <= 0.0 {
        return Err(AppError::Validation("Alert price must be > 0".into()));
    }
    if !factor.is_finite() || factor <= 0.0 {
        return Err(AppError::Validation("Exchange rate must be > 0".into()));
    }

    Ok(PriceAlert {
        asset,
        condition: input.condition,
        price: input.price / factor,
    })
}

/// Strict comparison: a live price equal to the threshold does not trigger.
pub fn is_triggered(alert: &PriceAlert, live_price: f64) -> bool {
    match alert.condition {
        AlertCondition::Above => live_price > alert.price,
        AlertCondition::Below => live_price < alert.price,
    }
}

pub async fn check(provider: &dyn PriceProvider, alert: PriceAlert) -> AlertCheck {
    match provider.fetch_latest_price(&usd_ticker(&alert.asset)).await {
        Ok(live_price) if is_triggered(&alert, live_price) => {
            info!("Price alert triggered: {} {:?} {} (live {})", alert.asset, alert.condition, alert.price, live_price);
            AlertCheck::Triggered { alert, live_price }
        }
        Ok(live_price) => AlertCheck::Pending { alert, live_price },
        Err(e) => {
            warn!("Failed to check price for {}: {}", alert.asset, e);
            AlertCheck::CheckFailed {
                reason: format!("Failed to check price for {}: {}", alert.asset, e),
                alert,
            }
        }
    }
}

/// Evaluates the session's alert, returning the state to write back.
/// A triggered alert is removed; pending or failed checks keep it.
pub async fn evaluate_session(
    provider: &dyn PriceProvider,
    mut session: SessionState,
) -> (SessionState, Option<AlertCheck>) {
    let Some(alert) = session.price_alert.clone() else {
        return (session, None);
    };

    let outcome = check(provider, alert).await;
    if matches!(outcome, AlertCheck::Triggered { .. }) {
        session.price_alert = None;
    }
    (session, Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::price_provider::ExternalPricePoint;
    use crate::external::ProviderError;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct LivePrice(Option<f64>);

    #[async_trait]
    impl PriceProvider for LivePrice {
        async fn fetch_daily_history(
            &self,
            ticker: &str,
            _days: u32,
        ) -> Result<Vec<ExternalPricePoint>, ProviderError> {
            self.0
                .map(|close| {
                    vec![ExternalPricePoint {
                        date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                        close,
                    }]
                })
                .ok_or_else(|| ProviderError::Network(format!("{} unreachable", ticker)))
        }
    }

    fn alert(condition: AlertCondition, price: f64) -> PriceAlert {
        PriceAlert {
            asset: "BTC".to_string(),
            condition,
            price,
        }
    }

    fn session_with(alert: PriceAlert) -> SessionState {
        SessionState {
            price_alert: Some(alert),
            ..SessionState::new()
        }
    }

    #[test]
    fn test_trigger_conditions_are_strict() {
        assert!(is_triggered(&alert(AlertCondition::Above, 100.0), 100.01));
        assert!(!is_triggered(&alert(AlertCondition::Above, 100.0), 100.0));
        assert!(is_triggered(&alert(AlertCondition::Below, 100.0), 99.99));
        assert!(!is_triggered(&alert(AlertCondition::Below, 100.0), 100.0));
    }

    #[test]
    fn test_threshold_converted_to_usd() {
        let input = SetPriceAlert {
            asset: "btc".to_string(),
            condition: AlertCondition::Above,
            price: 1_620_000_000.0,
        };
        let alert = from_display(input, 16200.0).unwrap();
        assert_eq!(alert.asset, "BTC");
        assert!((alert.price - 100_000.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_triggered_alert_fires_once_and_clears() {
        let provider = LivePrice(Some(70000.0));
        let session = session_with(alert(AlertCondition::Above, 65000.0));

        let (session, outcome) = evaluate_session(&provider, session).await;
        assert!(matches!(outcome, Some(AlertCheck::Triggered { live_price, .. }) if live_price == 70000.0));
        assert!(session.price_alert.is_none());

        let (_, outcome) = evaluate_session(&provider, session).await;
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_pending_and_failed_checks_keep_alert() {
        let session = session_with(alert(AlertCondition::Below, 50000.0));

        let (session, outcome) = evaluate_session(&LivePrice(Some(60000.0)), session).await;
        assert!(matches!(outcome, Some(AlertCheck::Pending { .. })));
        assert!(session.price_alert.is_some());

        let (session, outcome) = evaluate_session(&LivePrice(None), session).await;
        assert!(matches!(outcome, Some(AlertCheck::CheckFailed { .. })));
        assert!(session.price_alert.is_some());
    }
}
