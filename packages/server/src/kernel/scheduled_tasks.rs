//! Periodic scraping using tokio-cron-scheduler.
//!
//! ```text
//! Scheduler (SCRAPE_SCHEDULE)
//!     │
//!     └─► ScrapeLauncher::run(SCRAPE_KEYWORDS)
//!             └─► search pages → job cards → job store
//! ```

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};

use super::scrape::ScrapeLauncher;

/// Start the periodic scrape on `schedule` (six-field cron, seconds first).
pub async fn start_scheduler(
    schedule: &str,
    launcher: ScrapeLauncher,
    keywords: String,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let scrape_job = Job::new_async(schedule, move |_uuid, _lock| {
        let launcher = launcher.clone();
        let keywords = keywords.clone();
        Box::pin(async move {
            tracing::info!(keywords = %keywords, "Running scheduled scrape");
            if let Err(e) = launcher.run(&keywords).await {
                tracing::error!(error = %e, "Scheduled scrape failed");
            }
        })
    })
    .with_context(|| format!("Invalid SCRAPE_SCHEDULE {:?}", schedule))?;

    scheduler.add(scrape_job).await?;
    scheduler.start().await?;

    tracing::info!(schedule = %schedule, "Scheduled scraping started");
    Ok(scheduler)
}
