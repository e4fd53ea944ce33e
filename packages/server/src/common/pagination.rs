//! Cursor pagination for full-table job listings.
//!
//! The store's continuation key travels to clients as an opaque URL-safe
//! base64 string (`last_key`) and comes back unchanged on the next request.

use harvester::{decode_cursor, encode_cursor, CursorError, Job, ScanKey, ScanPage};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Query string of `GET /api/jobs/all`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub last_key: Option<String>,
}

impl PageQuery {
    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn start_key(&self) -> Result<Option<ScanKey>, CursorError> {
        match self.last_key.as_deref().map(str::trim) {
            Some(cursor) if !cursor.is_empty() => decode_cursor(cursor).map(Some),
            _ => Ok(None),
        }
    }
}

/// One page of jobs plus the cursor of the next page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedJobs {
    pub jobs: Vec<Job>,
    pub last_key: Option<String>,
}

impl PaginatedJobs {
    pub fn from_page(page: ScanPage) -> Result<Self, CursorError> {
        let last_key = page.last_key.as_ref().map(encode_cursor).transpose()?;
        Ok(Self {
            jobs: page.jobs,
            last_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(PageQuery::default().limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(PageQuery { limit: Some(0), last_key: None }.limit(), 1);
        assert_eq!(PageQuery { limit: Some(5000), last_key: None }.limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_cursor_round_trips_through_query() {
        let key = ScanKey::new("a@b.c", Uuid::new_v4());
        let page = PaginatedJobs::from_page(ScanPage {
            jobs: vec![],
            last_key: Some(key.clone()),
        })
        .unwrap();

        let query = PageQuery {
            limit: None,
            last_key: page.last_key,
        };
        assert_eq!(query.start_key().unwrap(), Some(key));
    }

    #[test]
    fn test_blank_cursor_means_first_page() {
        let query = PageQuery {
            limit: None,
            last_key: Some("  ".into()),
        };
        assert_eq!(query.start_key().unwrap(), None);
    }

    #[test]
    fn test_garbage_cursor_rejected() {
        let query = PageQuery {
            limit: None,
            last_key: Some("%%%".into()),
        };
        assert!(query.start_key().is_err());
    }
}
