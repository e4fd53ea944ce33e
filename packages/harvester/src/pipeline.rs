//! Scrape orchestration: search pages in, draft jobs out.
//!
//! A run walks the search-result pages strictly in order, parses every page
//! that could be fetched, pauses between pages, then writes every parsed job
//! to the store. A page that cannot be fetched after retries is skipped; a
//! job the store rejects is logged and the batch continues.

use tracing::{debug, error, info, warn};

use crate::error::ScrapeError;
use crate::http::{HttpClient, HttpClientConfig, PageFetcher};
use crate::parser::JobCardParser;
use crate::stores::JobStore;
use crate::types::config::ScrapeSettings;
use crate::types::job::Job;
use crate::types::report::ScrapeReport;

/// Guest search endpoint, one page of 25 cards per request.
const SEARCH_ENDPOINT: &str =
    "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";

const JOBS_PER_PAGE: u32 = 25;

/// Keywords used when a trigger supplies none.
pub const DEFAULT_KEYWORDS: &str = "python developer";

/// Search URL for one results page (0-based).
pub fn build_search_url(keywords: &str, location: &str, timespan: &str, page: u32) -> String {
    format!(
        "{}?keywords={}&location={}&f_WT=''&f_TPR={}&start={}",
        SEARCH_ENDPOINT,
        urlencoding::encode(keywords),
        urlencoding::encode(location),
        timespan,
        page * JOBS_PER_PAGE
    )
}

/// Closes the fetcher when the run ends, however it ends.
struct CloseOnDrop<'a, F: PageFetcher>(&'a F);

impl<F: PageFetcher> Drop for CloseOnDrop<'_, F> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// One scrape run over a fetcher and a store.
///
/// The fetcher is closed when [`run`](Scraper::run) returns, so a scraper is
/// good for a single run.
pub struct Scraper<F: PageFetcher, S: JobStore> {
    parser: JobCardParser<F>,
    store: S,
    settings: ScrapeSettings,
}

impl<F: PageFetcher, S: JobStore> Scraper<F, S> {
    pub fn new(fetcher: F, store: S, settings: ScrapeSettings) -> Self {
        let parser = JobCardParser::new(fetcher, settings.default_author.clone());
        Self {
            parser,
            store,
            settings,
        }
    }

    /// Scrape every configured page for `keywords` and import the results.
    ///
    /// Fails only when a search page hits a non-transient fetch error; jobs
    /// collected up to that point are not imported.
    pub async fn run(self, keywords: &str) -> Result<ScrapeReport, ScrapeError> {
        let _close = CloseOnDrop(self.parser.fetcher());
        let mut report = ScrapeReport::new(keywords);

        info!(
            keywords = %keywords,
            pages = self.settings.pages_to_scrape,
            location = %self.settings.location,
            "Starting scrape"
        );

        let jobs = match self.collect(keywords, &mut report).await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(keywords = %keywords, error = %e, "Scrape aborted");
                return Err(e);
            }
        };

        self.import(jobs, &mut report).await;

        info!(
            keywords = %keywords,
            pages_fetched = report.pages_fetched,
            pages_skipped = report.pages_skipped,
            jobs_imported = report.jobs_imported,
            jobs_failed = report.jobs_failed,
            "Scrape finished"
        );
        Ok(report)
    }

    async fn collect(&self, keywords: &str, report: &mut ScrapeReport) -> Result<Vec<Job>, ScrapeError> {
        let mut jobs = Vec::new();

        for page in 0..self.settings.pages_to_scrape {
            let url = build_search_url(
                keywords,
                &self.settings.location,
                &self.settings.timespan,
                page,
            );
            report.pages_requested += 1;
            info!(page, url = %url, "Scraping search page");

            match self.parser.fetcher().fetch(&url).await? {
                Some(search_page) => {
                    report.pages_fetched += 1;
                    let parsed = self.parser.parse_job_cards(&search_page).await;
                    debug!(page, jobs = parsed.len(), "Parsed search page");
                    report.jobs_parsed += parsed.len();
                    jobs.extend(parsed);

                    if !self.settings.request_delay.is_zero() {
                        tokio::time::sleep(self.settings.request_delay).await;
                    }
                }
                None => {
                    report.pages_skipped += 1;
                    warn!(page, url = %url, "Search page unavailable, skipping");
                }
            }
        }

        Ok(jobs)
    }

    async fn import(&self, jobs: Vec<Job>, report: &mut ScrapeReport) {
        for job in jobs {
            match self.store.add(&job).await {
                Ok(()) => {
                    report.jobs_imported += 1;
                    debug!(job_id = %job.id, title = %job.title, "Job imported");
                }
                Err(e) => {
                    report.jobs_failed += 1;
                    error!(job_id = %job.id, title = %job.title, error = %e, "Failed to import job");
                }
            }
        }
    }
}

/// Build a fresh client for one run and scrape `keywords` into `store`.
///
/// Each call owns its own client; concurrent runs share only the store.
pub async fn run_scrape<S: JobStore>(
    settings: ScrapeSettings,
    http_config: HttpClientConfig,
    store: S,
    keywords: &str,
) -> Result<ScrapeReport, ScrapeError> {
    settings.validate()?;
    let client = HttpClient::new(http_config)?;
    Scraper::new(client, store, settings).run(keywords).await
}
