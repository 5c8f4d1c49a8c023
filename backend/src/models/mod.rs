pub mod allocation;
pub mod journal;
pub mod market;
pub mod market_regime;
pub mod position;
pub mod presentation;
pub mod session;
pub mod transaction;
pub mod valuation;
pub mod wallet;

pub use allocation::{AllocationLine, AllocationPlan, AllocationRecommendation, AllocationRequest, AllocationStrategy};
pub use journal::{CreateJournalEntry, JournalEntry, JournalEntryView};
pub use market::{ExchangeRate, MarketOverview, ResearchRequest, ResearchResponse, SentimentIndex};
pub use market_regime::{RegimeAssessment, RegimeLabel, RegimeView};
pub use position::{Position, PositionsResponse};
pub use presentation::{Currency, DisplayQuery, Label, Terminology};
pub use session::{AlertCheck, AlertCondition, DashboardView, PriceAlert, SessionState, SetPriceAlert, UpdatePreferences};
pub use transaction::{CreateTransaction, ImportResult, NewTransaction, Transaction, TransactionType};
pub use valuation::{
    AssetValuation, FailedAsset, PortfolioSnapshot, PortfolioSummary, PortfolioSummaryView,
    SnapshotOutcome, ValuationSnapshot,
};
pub use wallet::{CreateWatchedWallet, TokenTransfer, TransferDirection, WalletTransfers, WatchedWallet};
