use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{AllocationRecommendation, AllocationRequest};
use crate::services::allocation_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/recommend", post(recommend))
}

pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<AllocationRequest>,
) -> Result<Json<AllocationRecommendation>, AppError> {
    info!("POST /api/allocations/recommend - strategy {:?}", request.strategy);

    let recommendation = allocation_service::recommend(
        &state.pool,
        state.price_provider.as_ref(),
        &state.config,
        request,
    )
    .await
    .map_err(|e| {
        warn!("Allocation recommendation unavailable: {}", e);
        e
    })?;

    Ok(Json(recommendation))
}
