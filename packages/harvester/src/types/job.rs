//! Job posting record and its lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::JobError;

/// Publication state of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Draft,
    Active,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "DRAFT",
            JobStatus::Active => "ACTIVE",
            JobStatus::Closed => "CLOSED",
        }
    }

    /// DRAFT → ACTIVE, DRAFT → CLOSED, ACTIVE → CLOSED. Nothing leaves CLOSED.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Draft, JobStatus::Active)
                | (JobStatus::Draft, JobStatus::Closed)
                | (JobStatus::Active, JobStatus::Closed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(JobStatus::Draft),
            "ACTIVE" => Ok(JobStatus::Active),
            "CLOSED" => Ok(JobStatus::Closed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// Fields supplied when a job is created, by a user or by the scraper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Partial update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPatch {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_url: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub status: Option<JobStatus>,
}

/// A job posting.
///
/// `id` never changes after creation and `updated_at` is refreshed by every
/// mutating method, so `updated_at >= created_at` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    /// Canonical source URL
    pub job_url: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub status: JobStatus,
    /// Identity of the creating principal
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new DRAFT job owned by `author`.
    pub fn create(new: NewJob, author: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: new.title,
            company: new.company,
            location: new.location,
            job_url: new.job_url,
            description: new.description,
            logo_url: new.logo_url,
            status: JobStatus::Draft,
            author: author.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn activate(&mut self) -> Result<(), JobError> {
        self.transition_to(JobStatus::Active)
    }

    pub fn close(&mut self) -> Result<(), JobError> {
        self.transition_to(JobStatus::Closed)
    }

    /// Move to `next` if the lifecycle allows it. On error the job is untouched.
    pub fn transition_to(&mut self, next: JobStatus) -> Result<(), JobError> {
        if !self.status.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    /// Apply a partial update.
    ///
    /// The status change is validated before any field is written, so a
    /// rejected patch leaves the job as it was.
    pub fn apply(&mut self, patch: JobPatch) -> Result<(), JobError> {
        if let Some(next) = patch.status {
            if next != self.status && !self.status.can_transition_to(next) {
                return Err(JobError::InvalidTransition {
                    from: self.status,
                    to: next,
                });
            }
            self.status = next;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(company) = patch.company {
            self.company = company;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(job_url) = patch.job_url {
            self.job_url = job_url;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(logo_url) = patch.logo_url {
            self.logo_url = Some(logo_url);
        }
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        // Clock skew must never push updated_at behind created_at.
        self.updated_at = Utc::now().max(self.created_at);
    }
}
