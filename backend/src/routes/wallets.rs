use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::{CreateWatchedWallet, WalletTransfers, WatchedWallet};
use crate::services::whale_watcher_service;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TransfersQuery {
    pub limit: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wallets).post(add_wallet))
        .route("/:id", delete(remove_wallet))
        .route("/:id/transfers", get(get_transfers))
}

pub async fn add_wallet(
    State(state): State<AppState>,
    Json(input): Json<CreateWatchedWallet>,
) -> Result<(StatusCode, Json<WatchedWallet>), AppError> {
    info!("POST /api/wallets - {}", input.label);
    let wallet = whale_watcher_service::add_wallet(&state.pool, input).await?;
    Ok((StatusCode::CREATED, Json(wallet)))
}

pub async fn list_wallets(State(state): State<AppState>) -> Result<Json<Vec<WatchedWallet>>, AppError> {
    info!("GET /api/wallets");
    Ok(Json(whale_watcher_service::list_wallets(&state.pool).await?))
}

pub async fn remove_wallet(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode, AppError> {
    info!("DELETE /api/wallets/{}", id);
    whale_watcher_service::remove_wallet(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_transfers(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<TransfersQuery>,
) -> Result<Json<WalletTransfers>, AppError> {
    info!("GET /api/wallets/{}/transfers - limit {:?}", id, query.limit);
    let transfers = whale_watcher_service::wallet_transfers(
        &state.pool,
        state.chain_history.as_deref(),
        id,
        query.limit,
    )
    .await?;
    Ok(Json(transfers))
}
