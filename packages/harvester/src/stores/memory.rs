//! In-memory job table for tests, dry runs and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{partition_key, status_index_key, JobStore, ScanKey, ScanPage};
use crate::error::{StoreError, StoreResult};
use crate::types::job::{Job, JobStatus};

#[derive(Debug, Clone)]
struct Item {
    job: Job,
    gs1pk: String,
    /// Insertion order within the status index
    gs1sk: (DateTime<Utc>, u64),
}

type Table = BTreeMap<ScanKey, Item>;

/// In-memory job table keyed like the production table.
///
/// Data is lost on drop.
#[derive(Default)]
pub struct MemoryJobStore {
    items: RwLock<Table>,
    sequence: AtomicU64,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Every stored job, in key order.
    pub fn snapshot(&self) -> Vec<Job> {
        self.read().values().map(|item| item.job.clone()).collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.items.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.items.write().unwrap_or_else(|e| e.into_inner())
    }

    fn item_for(&self, job: &Job) -> Item {
        Item {
            job: job.clone(),
            gs1pk: status_index_key(&job.author, job.status),
            gs1sk: (job.created_at, self.sequence.fetch_add(1, Ordering::Relaxed)),
        }
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn add(&self, job: &Job) -> StoreResult<()> {
        let item = self.item_for(job);
        self.write().insert(ScanKey::for_job(job), item);
        Ok(())
    }

    async fn get(&self, id: Uuid, author: &str) -> StoreResult<Job> {
        self.read()
            .get(&ScanKey::new(author, id))
            .map(|item| item.job.clone())
            .ok_or_else(|| StoreError::NotFound {
                id,
                author: author.to_string(),
            })
    }

    async fn get_by_author(&self, author: &str) -> StoreResult<Vec<Job>> {
        let pk = partition_key(author);
        let start = ScanKey {
            pk: pk.clone(),
            sk: String::new(),
        };
        Ok(self
            .read()
            .range(start..)
            .take_while(|(key, _)| key.pk == pk)
            .map(|(_, item)| item.job.clone())
            .collect())
    }

    async fn get_by_status(&self, author: &str, status: JobStatus) -> StoreResult<Vec<Job>> {
        let gs1pk = status_index_key(author, status);
        let table = self.read();
        let mut matches: Vec<&Item> = table.values().filter(|item| item.gs1pk == gs1pk).collect();
        matches.sort_by_key(|item| item.gs1sk);
        Ok(matches.into_iter().map(|item| item.job.clone()).collect())
    }

    async fn get_all(&self, limit: usize, start: Option<&ScanKey>) -> StoreResult<ScanPage> {
        use std::ops::Bound;

        let limit = limit.max(1);
        let table = self.read();
        let lower = match start {
            Some(key) => Bound::Excluded(key.clone()),
            None => Bound::Unbounded,
        };
        let mut iter = table.range((lower, Bound::Unbounded));
        let jobs: Vec<Job> = iter
            .by_ref()
            .take(limit)
            .map(|(_, item)| item.job.clone())
            .collect();

        let last_key = match (iter.next(), jobs.last()) {
            (Some(_), Some(last)) => Some(ScanKey::for_job(last)),
            _ => None,
        };

        Ok(ScanPage { jobs, last_key })
    }

    async fn update(&self, job: &Job) -> StoreResult<()> {
        let key = ScanKey::for_job(job);
        let mut table = self.write();
        let Some(existing) = table.get_mut(&key) else {
            return Err(StoreError::NotFound {
                id: job.id,
                author: job.author.clone(),
            });
        };
        existing.gs1pk = status_index_key(&job.author, job.status);
        existing.job = job.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid, author: &str) -> StoreResult<()> {
        self.write().remove(&ScanKey::new(author, id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::job::NewJob;

    fn job(author: &str, title: &str) -> Job {
        Job::create(
            NewJob {
                title: title.into(),
                company: "Big Corp".into(),
                location: "Remote".into(),
                job_url: "https://example.com".into(),
                description: "Join us!".into(),
                logo_url: None,
            },
            author,
        )
    }

    #[tokio::test]
    async fn test_added_job_retrieved_by_id() {
        let store = MemoryJobStore::new();
        let job = job("admin@email.com", "Software Engineer");
        store.add(&job).await.unwrap();
        assert_eq!(store.get(job.id, &job.author).await.unwrap(), job);
    }

    #[tokio::test]
    async fn test_get_is_scoped_to_author() {
        let store = MemoryJobStore::new();
        let job = job("admin@email.com", "Software Engineer");
        store.add(&job).await.unwrap();

        let err = store.get(job.id, "someone@else.com").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_status_index_follows_updates() {
        let store = MemoryJobStore::new();
        let mut active = job("admin@email.com", "Active");
        active.activate().unwrap();
        let mut closed = job("admin@email.com", "Closed");
        closed.close().unwrap();
        let draft = job("admin@email.com", "Draft");

        store.add(&active).await.unwrap();
        store.add(&closed).await.unwrap();
        store.add(&draft).await.unwrap();

        assert_eq!(store.get_active("admin@email.com").await.unwrap(), vec![active.clone()]);
        assert_eq!(store.get_closed("admin@email.com").await.unwrap(), vec![closed]);

        let mut promoted = draft.clone();
        promoted.activate().unwrap();
        store.update(&promoted).await.unwrap();

        let active_now = store.get_active("admin@email.com").await.unwrap();
        assert_eq!(active_now.len(), 2);
        assert_eq!(active_now[0].id, active.id);
        assert!(store
            .get_by_status("admin@email.com", JobStatus::Draft)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_job_is_not_found() {
        let store = MemoryJobStore::new();
        let err = store.update(&job("a@b.c", "ghost")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_by_author_and_delete() {
        let store = MemoryJobStore::new();
        let a1 = job("a@b.c", "one");
        let a2 = job("a@b.c", "two");
        let b1 = job("b@b.c", "three");
        for j in [&a1, &a2, &b1] {
            store.add(j).await.unwrap();
        }

        assert_eq!(store.get_by_author("a@b.c").await.unwrap().len(), 2);

        store.delete(a1.id, "a@b.c").await.unwrap();
        store.delete(a1.id, "a@b.c").await.unwrap();
        let remaining = store.get_by_author("a@b.c").await.unwrap();
        assert_eq!(remaining, vec![a2]);
    }

    #[tokio::test]
    async fn test_get_all_pages_through_table() {
        let store = MemoryJobStore::new();
        for i in 0..5 {
            store.add(&job(&format!("user{}@b.c", i % 2), &format!("job {}", i))).await.unwrap();
        }

        let first = store.get_all(2, None).await.unwrap();
        assert_eq!(first.jobs.len(), 2);
        let key = first.last_key.clone().expect("more pages");

        let second = store.get_all(2, Some(&key)).await.unwrap();
        assert_eq!(second.jobs.len(), 2);

        let third = store.get_all(2, second.last_key.as_ref()).await.unwrap();
        assert_eq!(third.jobs.len(), 1);
        assert!(third.last_key.is_none());

        let mut seen: Vec<Uuid> = first
            .jobs
            .iter()
            .chain(&second.jobs)
            .chain(&third.jobs)
            .map(|j| j.id)
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn test_get_all_zero_limit_still_yields_cursor() {
        let store = MemoryJobStore::new();
        for i in 0..2 {
            store.add(&job("a@b.c", &format!("job {}", i))).await.unwrap();
        }

        let first = store.get_all(0, None).await.unwrap();
        assert_eq!(first.jobs.len(), 1);
        let key = first.last_key.expect("rows remain");

        let second = store.get_all(0, Some(&key)).await.unwrap();
        assert_eq!(second.jobs.len(), 1);
        assert_ne!(second.jobs[0].id, first.jobs[0].id);
        assert!(second.last_key.is_none());
    }
}
