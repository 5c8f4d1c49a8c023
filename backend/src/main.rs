use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use pandu_backend::app;
use pandu_backend::config::AppConfig;
use pandu_backend::db;
use pandu_backend::external::etherscan::{ChainHistoryProvider, EtherscanProvider};
use pandu_backend::external::http_client;
use pandu_backend::external::market_data::PublicMarketDataProvider;
use pandu_backend::external::yahoo::YahooProvider;
use pandu_backend::logging::{init_logging, LoggingConfig};
use pandu_backend::services::job_scheduler_service::JobSchedulerService;
use pandu_backend::services::llm_service::{LlmConfig, LlmService};
use pandu_backend::services::session_service::SessionStore;
use pandu_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env()?;

    let pool = db::connect(&config.database_url, 5).await?;
    db::init_schema(&pool).await?;
    info!("Database ready");

    let client = http_client(config.http_timeout)?;
    let price_provider = Arc::new(YahooProvider::new(client.clone()));
    let market_data = Arc::new(PublicMarketDataProvider::new(client.clone()));

    let chain_history = match &config.etherscan_api_key {
        Some(key) => {
            info!("Whale watcher enabled");
            Some(Arc::new(EtherscanProvider::new(client, key.clone())) as Arc<dyn ChainHistoryProvider>)
        }
        None => {
            warn!("ETHERSCAN_API_KEY not set; whale watcher transfers disabled");
            None
        }
    };

    let llm = LlmService::new(LlmConfig::from_app_config(&config))?;

    let mut scheduler = JobSchedulerService::new(pool.clone(), price_provider.clone()).await?;
    scheduler.start(&config.snapshot_cron).await?;

    let bind_addr = config.bind_addr;
    let state = AppState {
        pool,
        price_provider,
        market_data,
        chain_history,
        llm: Arc::new(llm),
        sessions: SessionStore::new(),
        config: Arc::new(config),
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(bind_addr).await?;
    info!("Pandu Terminal backend running at http://{}/", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = scheduler.stop().await {
        error!("Scheduler shutdown failed: {}", e);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
