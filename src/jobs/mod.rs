// Jobs module - Scheduled background work

pub mod event_status;
pub mod match_refresh;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::config::Config;

/// Registers the background jobs and starts the scheduler
pub async fn start_scheduler(pool: PgPool, config: &Config) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let status_pool = pool.clone();
    scheduler
        .add(Job::new_async(
            config.event_status_schedule.as_str(),
            move |_id, _scheduler| {
                let pool = status_pool.clone();
                Box::pin(async move {
                    if let Err(e) = event_status::refresh_event_statuses(&pool).await {
                        tracing::error!(error = %e, "Event status job failed");
                    }
                })
            },
        )?)
        .await?;

    let match_pool = pool;
    scheduler
        .add(Job::new_async(
            config.match_refresh_schedule.as_str(),
            move |_id, _scheduler| {
                let pool = match_pool.clone();
                Box::pin(async move {
                    if let Err(e) = match_refresh::refresh_matches(&pool).await {
                        tracing::error!(error = %e, "Match refresh job failed");
                    }
                })
            },
        )?)
        .await?;

    scheduler.start().await?;

    tracing::info!(
        event_status_schedule = %config.event_status_schedule,
        match_refresh_schedule = %config.match_refresh_schedule,
        "Background jobs scheduled"
    );

    Ok(scheduler)
}
