use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::jobs::daily_snapshot_job;

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub pool: SqlitePool,
    pub price_provider: Arc<dyn PriceProvider>,
}

#[derive(Debug)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
}

impl JobSchedulerService {
    pub async fn new(pool: SqlitePool, price_provider: Arc<dyn PriceProvider>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            context: JobContext { pool, price_provider },
        })
    }

    /// Registers the jobs and starts ticking. `snapshot_cron` uses the
    /// six-field format (sec min hour day month weekday).
    pub async fn start(&mut self, snapshot_cron: &str) -> Result<(), AppError> {
        info!("Starting job scheduler...");

        self.schedule_job(
            snapshot_cron,
            "record_daily_snapshot",
            daily_snapshot_job::record_daily_snapshot,
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("Job scheduler started");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("Job scheduler stopped");
        Ok(())
    }

    async fn schedule_job<F, Fut>(&mut self, schedule: &str, job_name: &'static str, job_fn: F) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                execute_job(job_name, context, job_fn).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("Scheduled: {} [cron: {}]", job_name, schedule);
        Ok(())
    }
}

async fn execute_job<F, Fut>(job_name: &str, context: JobContext, job_fn: Arc<F>)
where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    info!("Starting job: {}", job_name);
    let started_at = Utc::now();

    let result = job_fn(context).await;
    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => info!(
            "Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
            job_name, job_result.items_processed, job_result.items_failed, duration_ms
        ),
        Err(e) => error!("Job failed: {} - {} ({}ms)", job_name, e, duration_ms),
    }
}
