//! End-of-day portfolio snapshot.
//!
//! Values the stored portfolio at live prices and records the day's total
//! under the same rules as a dashboard render: nothing is written for an
//! empty or partially priced portfolio, and a date that already has a
//! snapshot keeps its first value.

use chrono::Utc;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use crate::services::valuation_service;

pub async fn record_daily_snapshot(ctx: JobContext) -> Result<JobResult, AppError> {
    let summary = valuation_service::portfolio_summary(&ctx.pool, ctx.price_provider.as_ref()).await?;
    let today = Utc::now().date_naive();

    let outcome = valuation_service::record_daily_snapshot(&ctx.pool, today, &summary.valuation).await?;
    match &outcome.reason {
        None => info!("Daily snapshot for {} recorded", today),
        Some(reason) => warn!("Daily snapshot for {} not recorded: {}", today, reason),
    }

    Ok(JobResult {
        items_processed: summary.valuation.assets.len() as i32,
        items_failed: summary.valuation.failed_assets.len() as i32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, test_pool};
    use crate::external::price_provider::{ExternalPricePoint, PriceProvider};
    use crate::external::ProviderError;
    use crate::models::{NewTransaction, TransactionType};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;

    struct Flat(f64);

    #[async_trait]
    impl PriceProvider for Flat {
        async fn fetch_daily_history(&self, _ticker: &str, _days: u32) -> Result<Vec<ExternalPricePoint>, ProviderError> {
            Ok(vec![ExternalPricePoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                close: self.0,
            }])
        }
    }

    #[tokio::test]
    async fn test_job_records_once() {
        let pool = test_pool().await;
        db::transaction_queries::create(
            &pool,
            &NewTransaction {
                asset: "BTC".to_string(),
                tx_type: TransactionType::Buy,
                quantity: 2.0,
                price_usd: 40000.0,
                timestamp: Utc::now(),
            },
        )
        .await
        .unwrap();

        let ctx = JobContext {
            pool: pool.clone(),
            price_provider: Arc::new(Flat(50000.0)),
        };
        let result = record_daily_snapshot(ctx.clone()).await.unwrap();
        assert_eq!(result.items_processed, 1);
        record_daily_snapshot(ctx).await.unwrap();

        let history = db::snapshot_queries::fetch_history(&pool).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].total_value_usd, 100000.0);
    }
}
