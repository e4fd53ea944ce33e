//! HTTP fetching for the scraper.
//!
//! - [`PageFetcher`] - the seam the parser and pipeline depend on
//! - [`HttpClient`] - reqwest-backed fetcher with proxy rotation and retries
//! - [`RetryPolicy`] - exponential backoff with jitter

pub mod client;
pub mod retry;

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::types::page::Page;

pub use client::{HttpClient, HttpClientConfig};
pub use retry::RetryPolicy;

/// Source of HTML pages.
///
/// `Ok(None)` means the page could not be fetched after all retries and the
/// caller should skip it. `Err` is reserved for failures that retrying cannot
/// fix.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<Option<Page>>;

    /// Release the underlying connection resources. Idempotent.
    fn close(&self);
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &str) -> FetchResult<Option<Page>> {
        (**self).fetch(url).await
    }

    fn close(&self) {
        (**self).close()
    }
}
