use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::models::{DisplayQuery, MarketOverview, RegimeView};
use crate::services::{market_regime_service, market_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(get_overview))
        .route("/regime", get(get_regime))
}

pub async fn get_overview(State(state): State<AppState>) -> Json<MarketOverview> {
    info!("GET /api/market/overview");
    Json(
        market_service::overview(
            state.market_data.as_ref(),
            state.price_provider.as_ref(),
            state.config.fallback_usd_idr_rate,
        )
        .await,
    )
}

pub async fn get_regime(State(state): State<AppState>, Query(query): Query<DisplayQuery>) -> Json<RegimeView> {
    let benchmark = state.config.regime_benchmark.as_str();
    info!("GET /api/market/regime - benchmark {}", benchmark);

    let assessment = market_regime_service::assess(state.price_provider.as_ref(), benchmark).await;
    Json(market_regime_service::present(benchmark, assessment, query.terminology))
}
