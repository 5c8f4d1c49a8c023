use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{CreateTransaction, Currency, DisplayQuery, ImportResult, Transaction};
use crate::services::{csv_import_service, market_service, transaction_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/import", post(import_transactions))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Json(input): Json<CreateTransaction>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    info!("POST /api/transactions - {:?} {}", input.tx_type, input.asset);

    let tx = transaction_service::create(
        &state.pool,
        state.price_provider.as_ref(),
        state.config.fallback_usd_idr_rate,
        input,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn list_transactions(State(state): State<AppState>) -> Result<Json<Vec<Transaction>>, AppError> {
    info!("GET /api/transactions - Listing transactions");
    Ok(Json(transaction_service::list(&state.pool).await?))
}

/// CSV body; unit prices are read in `?currency=` (USD by default).
pub async fn import_transactions(
    State(state): State<AppState>,
    Query(query): Query<DisplayQuery>,
    body: String,
) -> Result<Json<ImportResult>, AppError> {
    info!("POST /api/transactions/import - {} bytes", body.len());

    let factor = match query.currency {
        Currency::Usd => 1.0,
        Currency::Idr => {
            market_service::usd_idr_rate(state.price_provider.as_ref(), state.config.fallback_usd_idr_rate)
                .await
                .usd_to_idr
        }
    };

    let result = csv_import_service::import_transactions(&state.pool, &body, query.currency, factor)
        .await
        .map_err(|e| {
            error!("CSV import failed: {:#}", e);
            AppError::Validation(format!("{:#}", e))
        })?;

    Ok(Json(result))
}
