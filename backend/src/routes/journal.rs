use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{CreateJournalEntry, JournalEntry, JournalEntryView};
use crate::services::journal_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_entries).post(create_entry))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Json(input): Json<CreateJournalEntry>,
) -> Result<(StatusCode, Json<JournalEntry>), AppError> {
    info!("POST /api/journal - transaction {}", input.transaction_id);
    let entry = journal_service::create(&state.pool, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_entries(State(state): State<AppState>) -> Result<Json<Vec<JournalEntryView>>, AppError> {
    info!("GET /api/journal");
    Ok(Json(journal_service::list(&state.pool).await?))
}
