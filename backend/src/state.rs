use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::external::etherscan::ChainHistoryProvider;
use crate::external::market_data::MarketDataProvider;
use crate::external::price_provider::PriceProvider;
use crate::services::llm_service::LlmService;
use crate::services::session_service::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub price_provider: Arc<dyn PriceProvider>,
    pub market_data: Arc<dyn MarketDataProvider>,
    /// `None` when no block-explorer key is configured.
    pub chain_history: Option<Arc<dyn ChainHistoryProvider>>,
    pub llm: Arc<LlmService>,
    pub sessions: SessionStore,
    pub config: Arc<AppConfig>,
}
