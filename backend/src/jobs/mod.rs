//! Background jobs run by the job scheduler service.
//!
//! - `daily_snapshot_job` - records the end-of-day portfolio value

pub mod daily_snapshot_job;
