use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tracing::info;

use crate::db;
use crate::errors::AppError;
use crate::models::{DisplayQuery, PortfolioSnapshot, PortfolioSummaryView, PositionsResponse, SnapshotOutcome};
use crate::services::{market_service, position_service, valuation_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/positions", get(get_positions))
        .route("/valuation", get(get_valuation))
        .route("/snapshots", post(record_snapshot))
        .route("/history", get(get_history))
}

pub async fn get_positions(State(state): State<AppState>) -> Result<Json<PositionsResponse>, AppError> {
    info!("GET /api/portfolio/positions");
    Ok(Json(position_service::current_positions(&state.pool).await?))
}

pub async fn get_valuation(
    State(state): State<AppState>,
    Query(query): Query<DisplayQuery>,
) -> Result<Json<PortfolioSummaryView>, AppError> {
    info!("GET /api/portfolio/valuation - currency {:?}", query.currency);

    let prices = state.price_provider.as_ref();
    let (summary, rate) = tokio::join!(
        valuation_service::portfolio_summary(&state.pool, prices),
        market_service::usd_idr_rate(prices, state.config.fallback_usd_idr_rate),
    );
    let factor = market_service::conversion_factor(query.currency, &rate);

    Ok(Json(PortfolioSummaryView::new(&summary?, query.currency, factor)))
}

pub async fn record_snapshot(State(state): State<AppState>) -> Result<Json<SnapshotOutcome>, AppError> {
    info!("POST /api/portfolio/snapshots");

    let summary = valuation_service::portfolio_summary(&state.pool, state.price_provider.as_ref()).await?;
    let today = Utc::now().date_naive();
    let outcome = valuation_service::record_daily_snapshot(&state.pool, today, &summary.valuation).await?;

    Ok(Json(outcome))
}

pub async fn get_history(State(state): State<AppState>) -> Result<Json<Vec<PortfolioSnapshot>>, AppError> {
    info!("GET /api/portfolio/history");
    Ok(Json(db::snapshot_queries::fetch_history(&state.pool).await?))
}
