pub mod allocation_service;
pub mod alert_service;
pub mod csv_import_service;
pub mod indicators;
pub mod job_scheduler_service;
pub mod journal_service;
pub mod llm_service;
pub mod market_regime_service;
pub mod market_service;
pub mod position_service;
pub mod session_service;
pub mod transaction_service;
pub mod valuation_service;
pub mod whale_watcher_service;
