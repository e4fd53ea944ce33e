use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use harvester::{Job, JobPatch, JobStatus, NewJob};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::common::{PageQuery, PaginatedJobs};
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    fn status(&self) -> Result<Option<JobStatus>, ApiError> {
        self.status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().parse::<JobStatus>().map_err(ApiError::BadRequest))
            .transpose()
    }
}

/// Create a DRAFT job owned by the caller.
pub async fn create_job_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(body): Json<NewJob>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    let job = Job::create(body, user.author());
    state.store.add(&job).await?;
    info!(job_id = %job.id, author = %job.author, "Job created");
    Ok((StatusCode::CREATED, Json(job)))
}

/// The caller's jobs, optionally narrowed to one status.
pub async fn list_jobs_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let jobs = match query.status()? {
        Some(status) => state.store.get_by_status(user.author(), status).await?,
        None => state.store.get_by_author(user.author()).await?,
    };
    Ok(Json(jobs))
}

/// Every job in the store, one page at a time.
pub async fn list_all_jobs_handler(
    Extension(state): Extension<AppState>,
    _user: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedJobs>, ApiError> {
    let start = query.start_key()?;
    let page = state.store.get_all(query.limit(), start.as_ref()).await?;
    Ok(Json(PaginatedJobs::from_page(page)?))
}

pub async fn get_job_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    let job = state.store.get(id, user.author()).await?;
    Ok(Json(job))
}

/// Partial update. A status change must follow the job lifecycle.
pub async fn update_job_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<JobPatch>,
) -> Result<Json<Job>, ApiError> {
    let mut job = state.store.get(id, user.author()).await?;
    job.apply(patch)?;
    state.store.update(&job).await?;
    info!(job_id = %job.id, status = %job.status, "Job updated");
    Ok(Json(job))
}

pub async fn delete_job_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(id, user.author()).await?;
    info!(job_id = %id, "Job deleted");
    Ok(StatusCode::NO_CONTENT)
}
