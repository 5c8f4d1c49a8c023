use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{DashboardView, PortfolioSummaryView, SessionState, SetPriceAlert, UpdatePreferences};
use crate::services::{alert_service, market_regime_service, market_service, valuation_service};
use crate::state::AppState;

/// In-memory per-session state. Callers take a copy, work on it, and save it back.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> SessionState {
        let session = SessionState::new();
        self.sessions.insert(session.id, session.clone());
        info!("Created session {}", session.id);
        session
    }

    pub fn get(&self, id: Uuid) -> Result<SessionState, AppError> {
        self.sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
    }

    pub fn save(&self, session: SessionState) {
        self.sessions.insert(session.id, session);
    }
}

pub fn apply_preferences(mut session: SessionState, update: UpdatePreferences) -> SessionState {
    if let Some(currency) = update.currency {
        session.currency = currency;
    }
    if let Some(terminology) = update.terminology {
        session.terminology = terminology;
    }
    session
}

/// Replaces the session's alert; the threshold is read in the session's currency.
pub async fn set_alert(
    state: &AppState,
    mut session: SessionState,
    input: SetPriceAlert,
) -> Result<SessionState, AppError> {
    let rate = market_service::usd_idr_rate(state.price_provider.as_ref(), state.config.fallback_usd_idr_rate).await;
    let factor = market_service::conversion_factor(session.currency, &rate);
    session.price_alert = Some(alert_service::from_display(input, factor)?);
    Ok(session)
}

/// One full dashboard render. Returns the view and the session state to store.
pub async fn render_dashboard(
    state: &AppState,
    session: SessionState,
) -> Result<(DashboardView, SessionState), AppError> {
    let prices = state.price_provider.as_ref();
    let benchmark = state.config.regime_benchmark.as_str();

    let (market, assessment, summary) = tokio::join!(
        market_service::overview(state.market_data.as_ref(), prices, state.config.fallback_usd_idr_rate),
        market_regime_service::assess(prices, benchmark),
        valuation_service::portfolio_summary(&state.pool, prices),
    );
    let summary = summary?;

    let today = Utc::now().date_naive();
    let snapshot = valuation_service::record_daily_snapshot(&state.pool, today, &summary.valuation).await?;
    let history = db::snapshot_queries::fetch_history(&state.pool).await?;

    let (session, alert) = alert_service::evaluate_session(prices, session).await;

    let factor = market_service::conversion_factor(session.currency, &market.exchange_rate);
    let view = DashboardView {
        labels: session.terminology.labels(),
        regime: market_regime_service::present(benchmark, assessment, session.terminology),
        portfolio: PortfolioSummaryView::new(&summary, session.currency, factor),
        market,
        snapshot,
        history,
        alert,
        session: session.clone(),
    };

    Ok((view, session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, Terminology};

    #[test]
    fn test_store_round_trip() {
        let store = SessionStore::new();
        let mut session = store.create();
        assert_eq!(store.get(session.id).unwrap(), session);

        session.currency = Currency::Idr;
        store.save(session.clone());
        assert_eq!(store.get(session.id).unwrap().currency, Currency::Idr);
        assert!(matches!(store.get(Uuid::new_v4()), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_partial_preference_update() {
        let session = SessionState::new();
        let updated = apply_preferences(
            session,
            UpdatePreferences {
                currency: None,
                terminology: Some(Terminology::WarRoom),
            },
        );
        assert_eq!(updated.currency, Currency::Usd);
        assert_eq!(updated.terminology, Terminology::WarRoom);
    }
}
