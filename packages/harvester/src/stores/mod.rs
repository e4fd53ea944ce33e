//! Job persistence.
//!
//! The store is a keyed table with two access patterns:
//!
//! - primary key: `PK = "#{author}"`, `SK = "#{id}"` (point lookup and
//!   author-scoped listing)
//! - status index: `GS1PK = "#{author}#{STATUS}"`, ordered by insertion time
//!
//! Available backends:
//! - `MemoryJobStore` - in-memory table (always available)
//! - `PostgresJobStore` - PostgreSQL table (requires `postgres` feature)

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::types::job::{Job, JobStatus};

pub use memory::MemoryJobStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresJobStore;

/// Partition key for an author.
pub fn partition_key(author: &str) -> String {
    format!("#{}", author)
}

/// Sort key for a job id.
pub fn sort_key(id: Uuid) -> String {
    format!("#{}", id)
}

/// Status index key for an author and status.
pub fn status_index_key(author: &str, status: JobStatus) -> String {
    format!("#{}#{}", author, status.as_str())
}

/// Continuation token of a full-table scan: the key of the last item returned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScanKey {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
}

impl ScanKey {
    pub fn new(author: &str, id: Uuid) -> Self {
        Self {
            pk: partition_key(author),
            sk: sort_key(id),
        }
    }

    pub fn for_job(job: &Job) -> Self {
        Self::new(&job.author, job.id)
    }
}

/// One page of a full-table scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub jobs: Vec<Job>,
    /// Present when more items follow
    pub last_key: Option<ScanKey>,
}

/// Keyed job persistence.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Put a job under its (author, id) key, replacing any existing item.
    async fn add(&self, job: &Job) -> StoreResult<()>;

    /// Point lookup. Missing items are `StoreError::NotFound`.
    async fn get(&self, id: Uuid, author: &str) -> StoreResult<Job>;

    /// All jobs of one author.
    async fn get_by_author(&self, author: &str) -> StoreResult<Vec<Job>>;

    /// Jobs of one author in one status, oldest first.
    async fn get_by_status(&self, author: &str, status: JobStatus) -> StoreResult<Vec<Job>>;

    async fn get_active(&self, author: &str) -> StoreResult<Vec<Job>> {
        self.get_by_status(author, JobStatus::Active).await
    }

    async fn get_closed(&self, author: &str) -> StoreResult<Vec<Job>> {
        self.get_by_status(author, JobStatus::Closed).await
    }

    /// Up to `limit` jobs across all authors, continuing after `start`.
    ///
    /// A `limit` of zero is read as one, so `last_key` is set whenever
    /// rows remain.
    async fn get_all(&self, limit: usize, start: Option<&ScanKey>) -> StoreResult<ScanPage>;

    /// Overwrite an existing job. Missing items are `StoreError::NotFound`.
    async fn update(&self, job: &Job) -> StoreResult<()>;

    /// Remove a job. Deleting a missing item is not an error.
    async fn delete(&self, id: Uuid, author: &str) -> StoreResult<()>;
}

#[async_trait]
impl<T: JobStore + ?Sized> JobStore for std::sync::Arc<T> {
    async fn add(&self, job: &Job) -> StoreResult<()> {
        (**self).add(job).await
    }

    async fn get(&self, id: Uuid, author: &str) -> StoreResult<Job> {
        (**self).get(id, author).await
    }

    async fn get_by_author(&self, author: &str) -> StoreResult<Vec<Job>> {
        (**self).get_by_author(author).await
    }

    async fn get_by_status(&self, author: &str, status: JobStatus) -> StoreResult<Vec<Job>> {
        (**self).get_by_status(author, status).await
    }

    async fn get_all(&self, limit: usize, start: Option<&ScanKey>) -> StoreResult<ScanPage> {
        (**self).get_all(limit, start).await
    }

    async fn update(&self, job: &Job) -> StoreResult<()> {
        (**self).update(job).await
    }

    async fn delete(&self, id: Uuid, author: &str) -> StoreResult<()> {
        (**self).delete(id, author).await
    }
}
