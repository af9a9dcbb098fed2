//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! The sweeps run independently of the per-application lifecycle
//! instances; they re-scan the record store and notify anything the
//! instances missed. Schedules:
//! - Hourly sweep, business hours on weekdays
//! - Intensive sweep every 5 minutes, 06:00-22:00
//! - Daily summary at 08:00

use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::applications::sweeps;
use crate::kernel::TrackerDeps;

/// Start all scheduled sweeps
pub async fn start_scheduler(deps: Arc<TrackerDeps>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Hourly deadline sweep - weekday business hours
    let hourly_deps = deps.clone();
    let hourly_job = Job::new_async("0 0 9-18 * * MON-FRI", move |_uuid, _lock| {
        let deps = hourly_deps.clone();
        Box::pin(async move {
            if let Err(e) = sweeps::run_hourly_sweep(&deps).await {
                tracing::error!("Hourly sweep failed: {:#}", e);
            }
        })
    })?;
    scheduler.add(hourly_job).await?;

    // Intensive sweep - every 5 minutes during waking hours
    let intensive_deps = deps.clone();
    let intensive_job = Job::new_async("0 */5 6-22 * * *", move |_uuid, _lock| {
        let deps = intensive_deps.clone();
        Box::pin(async move {
            if let Err(e) = sweeps::run_intensive_sweep(&deps).await {
                tracing::error!("Intensive sweep failed: {:#}", e);
            }
        })
    })?;
    scheduler.add(intensive_job).await?;

    // Morning digest
    let summary_deps = deps.clone();
    let summary_job = Job::new_async("0 0 8 * * *", move |_uuid, _lock| {
        let deps = summary_deps.clone();
        Box::pin(async move {
            if let Err(e) = sweeps::run_daily_summary(&deps).await {
                tracing::error!("Daily summary failed: {:#}", e);
            }
        })
    })?;
    scheduler.add(summary_job).await?;

    scheduler.start().await?;
    tracing::info!(
        "Scheduled sweeps started (hourly, intensive every 5 minutes, daily summary at 08:00)"
    );
    Ok(scheduler)
}
