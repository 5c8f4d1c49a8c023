use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{DashboardView, SessionState, SetPriceAlert, UpdatePreferences};
use crate::services::session_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/:id", get(get_session))
        .route("/:id/preferences", put(update_preferences))
        .route("/:id/alert", put(set_alert).delete(clear_alert))
        .route("/:id/dashboard", get(get_dashboard))
}

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionState>) {
    info!("POST /api/sessions");
    (StatusCode::CREATED, Json(state.sessions.create()))
}

pub async fn get_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<SessionState>, AppError> {
    info!("GET /api/sessions/{}", id);
    Ok(Json(state.sessions.get(id)?))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdatePreferences>,
) -> Result<Json<SessionState>, AppError> {
    info!("PUT /api/sessions/{}/preferences - {:?}", id, update);
    let session = session_service::apply_preferences(state.sessions.get(id)?, update);
    state.sessions.save(session.clone());
    Ok(Json(session))
}

pub async fn set_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SetPriceAlert>,
) -> Result<Json<SessionState>, AppError> {
    info!("PUT /api/sessions/{}/alert - {} {:?}", id, input.asset, input.condition);
    let session = session_service::set_alert(&state, state.sessions.get(id)?, input).await?;
    state.sessions.save(session.clone());
    Ok(Json(session))
}

pub async fn clear_alert(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<SessionState>, AppError> {
    info!("DELETE /api/sessions/{}/alert", id);
    let mut session = state.sessions.get(id)?;
    session.price_alert = None;
    state.sessions.save(session.clone());
    Ok(Json(session))
}

pub async fn get_dashboard(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<DashboardView>, AppError> {
    info!("GET /api/sessions/{}/dashboard", id);
    let (view, session) = session_service::render_dashboard(&state, state.sessions.get(id)?).await?;
    state.sessions.save(session);
    Ok(Json(view))
}
