use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use tracing::info;

use crate::errors::AppError;
use crate::models::{ResearchRequest, ResearchResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(research))
}

/// LLM failures come back as explanatory text in `analysis`, never as an error status.
pub async fn research(
    State(state): State<AppState>,
    Json(request): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>, AppError> {
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(AppError::Validation("Research topic cannot be empty".into()));
    }
    info!("POST /api/research - topic '{}'", topic);

    let today = Utc::now().date_naive();
    let analysis = state.llm.analyze_topic(topic, today).await;

    Ok(Json(ResearchResponse {
        topic: topic.to_string(),
        date: today.format("%d %B %Y").to_string(),
        analysis,
    }))
}
