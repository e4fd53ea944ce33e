//! Job records, job persistence and a resilient job-listing scraper.
//!
//! The scraper walks the guest search pages of a public job-search site,
//! turns every job card into a `DRAFT` [`Job`], and writes the batch into a
//! [`JobStore`]. Network failures are retried with exponential backoff and
//! optional proxy rotation; a page that stays unavailable is skipped, a card
//! that cannot be parsed is dropped, and a job the store rejects is logged.
//!
//! # Usage
//!
//! ```rust,ignore
//! use harvester::{run_scrape, HttpClientConfig, MemoryJobStore, ScrapeSettings};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryJobStore::new());
//! let report = run_scrape(
//!     ScrapeSettings::default().with_pages(2),
//!     HttpClientConfig::default(),
//!     store.clone(),
//!     "rust developer",
//! )
//! .await?;
//! println!("imported {} jobs", report.jobs_imported);
//! ```
//!
//! # Modules
//!
//! - [`types`] - jobs, scrape settings, proxy config, run reports
//! - [`http`] - page fetching with retries and proxy rotation
//! - [`parser`] - job-card and job-description extraction
//! - [`pipeline`] - the scrape run
//! - [`stores`] - job persistence (memory, PostgreSQL)
//! - [`cursor`] - opaque pagination tokens
//! - [`testing`] - scripted fetcher and failing store

pub mod cursor;
pub mod error;
pub mod http;
pub mod parser;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod types;

pub use cursor::{decode_cursor, encode_cursor};
pub use error::{
    CardError, ConfigError, CursorError, FetchError, JobError, ScrapeError, StoreError,
};
pub use http::{HttpClient, HttpClientConfig, PageFetcher, RetryPolicy};
pub use parser::{parse_job_description, JobCardParser};
pub use pipeline::{build_search_url, run_scrape, Scraper, DEFAULT_KEYWORDS};
pub use stores::{JobStore, MemoryJobStore, ScanKey, ScanPage};
pub use types::{
    config::{ProxyConfig, ScrapeSettings},
    job::{Job, JobPatch, JobStatus, NewJob},
    page::Page,
    report::ScrapeReport,
};

#[cfg(feature = "postgres")]
pub use stores::PostgresJobStore;
