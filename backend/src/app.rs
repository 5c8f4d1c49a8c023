use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{allocations, health, journal, market, portfolio, research, sessions, transactions, wallets};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/transactions", transactions::router())
        .nest("/api/portfolio", portfolio::router())
        .nest("/api/allocations", allocations::router())
        .nest("/api/market", market::router())
        .nest("/api/research", research::router())
        .nest("/api/journal", journal::router())
        .nest("/api/wallets", wallets::router())
        .nest("/api/sessions", sessions::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
