//! Outcome summary of a scrape run.

use serde::Serialize;

/// Counters collected during one scrape run.
///
/// Background callers only log this; the CLI prints it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeReport {
    pub keywords: String,
    pub pages_requested: u32,
    pub pages_fetched: u32,
    pub pages_skipped: u32,
    pub jobs_parsed: usize,
    pub jobs_imported: usize,
    pub jobs_failed: usize,
}

impl ScrapeReport {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            ..Default::default()
        }
    }

    /// True when at least one job was parsed and every parsed job was stored.
    pub fn is_complete(&self) -> bool {
        self.jobs_parsed > 0 && self.jobs_failed == 0 && self.jobs_imported == self.jobs_parsed
    }
}
