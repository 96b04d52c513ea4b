use chrono::FixedOffset;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::CleanupConfig;
use crate::dto::cleanup_dto::CleanupSummary;
use crate::error::{Error, Result};
use crate::services::cleanup_service::CleanupEngine;

/// Runs one sweep and logs its outcome. Shared by the cron jobs and the admin
/// trigger.
pub async fn run_now(engine: &CleanupEngine, trigger: &str) -> Result<CleanupSummary> {
    tracing::info!(trigger, "Running application cleanup");
    match engine.run().await {
        Ok(summary) => {
            tracing::info!(
                trigger,
                deleted_applications = summary.deleted_applications,
                deleted_files = summary.deleted_files,
                "Cleanup run completed"
            );
            Ok(summary)
        }
        Err(e) => {
            tracing::error!(trigger, error = %e, "Cleanup run failed");
            Err(e)
        }
    }
}

/// Keeps the cron jobs alive for as long as it is held.
pub struct CleanupScheduler {
    scheduler: JobScheduler,
}

impl CleanupScheduler {
    /// Registers the daily and frequent sweeps. Returns `None` when cleanup is
    /// disabled in config.
    pub async fn start(engine: Arc<CleanupEngine>, config: &CleanupConfig) -> Result<Option<Self>> {
        if !config.enabled {
            tracing::info!("Scheduled cleanup disabled");
            return Ok(None);
        }

        let offset = FixedOffset::east_opt(config.utc_offset_hours * 3600).ok_or_else(|| {
            Error::Config(format!("Invalid UTC offset: {}", config.utc_offset_hours))
        })?;

        let scheduler = JobScheduler::new().await?;
        for (trigger, cron) in [("daily", &config.daily_cron), ("frequent", &config.frequent_cron)] {
            let engine = engine.clone();
            let job = Job::new_async_tz(cron.as_str(), offset, move |_id, _scheduler| {
                let engine = engine.clone();
                Box::pin(async move {
                    // failures are already logged by run_now
                    let _ = run_now(&engine, trigger).await;
                })
            })?;
            scheduler.add(job).await?;
            tracing::info!(trigger, cron = %cron, offset = %offset, "Scheduled cleanup job");
        }
        scheduler.start().await?;

        Ok(Some(Self { scheduler }))
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        Ok(())
    }
}
