//! Starting scrape runs from the API, the scheduler and the CLI.

use std::sync::Arc;

use harvester::{run_scrape, HttpClientConfig, JobStore, ScrapeError, ScrapeReport, ScrapeSettings};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Fire-and-forget scrape trigger.
pub trait ScrapeTrigger: Send + Sync {
    /// Start a run in the background and return at once.
    fn trigger(&self, keywords: String);
}

/// Runs scrapes against the shared job store.
///
/// Every run builds its own HTTP client; runs share only the store.
#[derive(Clone)]
pub struct ScrapeLauncher {
    settings: ScrapeSettings,
    http_config: HttpClientConfig,
    store: Arc<dyn JobStore>,
}

impl ScrapeLauncher {
    pub fn new(settings: ScrapeSettings, http_config: HttpClientConfig, store: Arc<dyn JobStore>) -> Self {
        Self {
            settings,
            http_config,
            store,
        }
    }

    /// Run to completion.
    pub async fn run(&self, keywords: &str) -> Result<ScrapeReport, ScrapeError> {
        run_scrape(
            self.settings.clone(),
            self.http_config.clone(),
            self.store.clone(),
            keywords,
        )
        .await
    }

    /// Spawn a run. The handle is only useful to tests; callers drop it.
    pub fn spawn(&self, keywords: String) -> JoinHandle<()> {
        let launcher = self.clone();
        tokio::spawn(async move {
            match launcher.run(&keywords).await {
                Ok(report) => info!(
                    keywords = %keywords,
                    imported = report.jobs_imported,
                    failed = report.jobs_failed,
                    "Background scrape finished"
                ),
                Err(e) => error!(keywords = %keywords, error = %e, "Background scrape failed"),
            }
        })
    }
}

impl ScrapeTrigger for ScrapeLauncher {
    fn trigger(&self, keywords: String) {
        info!(keywords = %keywords, "Scraping task added");
        drop(self.spawn(keywords));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester::MemoryJobStore;

    fn launcher(settings: ScrapeSettings) -> ScrapeLauncher {
        ScrapeLauncher::new(
            settings,
            HttpClientConfig::default(),
            Arc::new(MemoryJobStore::new()),
        )
    }

    #[tokio::test]
    async fn test_zero_pages_finishes_without_requests() {
        let launcher = launcher(ScrapeSettings::default().with_pages(0));
        let report = launcher.run("rust developer").await.unwrap();
        assert_eq!(report.keywords, "rust developer");
        assert_eq!(report.pages_requested, 0);
        assert_eq!(report.jobs_imported, 0);
    }

    #[tokio::test]
    async fn test_invalid_settings_fail_the_run() {
        let launcher = launcher(ScrapeSettings::default().with_default_author(" "));
        let err = launcher.run("rust developer").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[tokio::test]
    async fn test_spawned_run_completes_in_background() {
        let launcher = launcher(ScrapeSettings::default().with_pages(0));
        let handle = launcher.spawn("rust developer".into());
        handle.await.unwrap();
    }
}
