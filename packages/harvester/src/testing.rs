//! Test doubles for the fetcher and store seams.
//!
//! Lets callers exercise the parser and the scrape pipeline without network
//! access or a database.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{FetchError, FetchResult, StoreError, StoreResult};
use crate::http::PageFetcher;
use crate::stores::{JobStore, MemoryJobStore, ScanKey, ScanPage};
use crate::types::job::{Job, JobStatus};
use crate::types::page::Page;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Scripted answer for one URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// 2xx with this body
    Html(String),
    /// Retries exhausted (`Ok(None)`)
    Unavailable,
    /// Non-transient failure (`Err(InvalidUrl)`)
    Broken,
}

/// A scripted [`PageFetcher`].
///
/// URLs without a script answer [`MockResponse::Unavailable`].
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, MockResponse>>,
    calls: Mutex<Vec<String>>,
    closes: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.respond(url, MockResponse::Html(html.into()))
    }

    pub fn with_unavailable(self, url: impl Into<String>) -> Self {
        self.respond(url, MockResponse::Unavailable)
    }

    pub fn with_broken(self, url: impl Into<String>) -> Self {
        self.respond(url, MockResponse::Broken)
    }

    fn respond(self, url: impl Into<String>, response: MockResponse) -> Self {
        lock(&self.responses).insert(url.into(), response);
        self
    }

    /// Every URL fetched, in call order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        lock(&self.calls).iter().filter(|u| *u == url).count()
    }

    /// How many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<Option<Page>> {
        if self.is_closed() {
            return Err(FetchError::Closed);
        }
        lock(&self.calls).push(url.to_string());

        let response = lock(&self.responses)
            .get(url)
            .cloned()
            .unwrap_or(MockResponse::Unavailable);

        match response {
            MockResponse::Html(html) => Ok(Some(Page::new(url, html))),
            MockResponse::Unavailable => Ok(None),
            MockResponse::Broken => Err(FetchError::InvalidUrl {
                url: url.to_string(),
            }),
        }
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// A [`MemoryJobStore`] that rejects selected writes.
#[derive(Default)]
pub struct FailingJobStore {
    inner: MemoryJobStore,
    reject_titles: Mutex<HashSet<String>>,
    reject_nth_add: Option<usize>,
    adds: AtomicUsize,
}

impl FailingJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every `add` of a job with this title.
    pub fn reject_title(self, title: impl Into<String>) -> Self {
        lock(&self.reject_titles).insert(title.into());
        self
    }

    /// Reject the `n`th call to `add` (1-based).
    pub fn reject_nth_add(mut self, n: usize) -> Self {
        self.reject_nth_add = Some(n);
        self
    }

    pub fn inner(&self) -> &MemoryJobStore {
        &self.inner
    }

    fn rejection(reason: String) -> StoreError {
        StoreError::backend(std::io::Error::other(reason))
    }
}

#[async_trait]
impl JobStore for FailingJobStore {
    async fn add(&self, job: &Job) -> StoreResult<()> {
        let n = self.adds.fetch_add(1, Ordering::SeqCst) + 1;
        if self.reject_nth_add == Some(n) {
            return Err(Self::rejection(format!("write #{} rejected", n)));
        }
        if lock(&self.reject_titles).contains(&job.title) {
            return Err(Self::rejection(format!("write of {:?} rejected", job.title)));
        }
        self.inner.add(job).await
    }

    async fn get(&self, id: Uuid, author: &str) -> StoreResult<Job> {
        self.inner.get(id, author).await
    }

    async fn get_by_author(&self, author: &str) -> StoreResult<Vec<Job>> {
        self.inner.get_by_author(author).await
    }

    async fn get_by_status(&self, author: &str, status: JobStatus) -> StoreResult<Vec<Job>> {
        self.inner.get_by_status(author, status).await
    }

    async fn get_all(&self, limit: usize, start: Option<&ScanKey>) -> StoreResult<ScanPage> {
        self.inner.get_all(limit, start).await
    }

    async fn update(&self, job: &Job) -> StoreResult<()> {
        self.inner.update(job).await
    }

    async fn delete(&self, id: Uuid, author: &str) -> StoreResult<()> {
        self.inner.delete(id, author).await
    }
}
