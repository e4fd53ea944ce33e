//! HTTP error mapping.
//!
//! Every handler returns `Result<_, ApiError>`. The body is always
//! `{"detail": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cognito::CognitoError;
use harvester::{CursorError, JobError, StoreError};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::domains::auth::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid token")]
    Unauthorized,

    #[error("Access forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Provider { status: StatusCode, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Provider { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Internal(e) => {
                error!(error = ?e, "Internal error");
                "Internal server error".to_string()
            }
            other => {
                debug!(status = %status, error = %other, "Request failed");
                other.to_string()
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { id, .. } => ApiError::NotFound(format!("Job {} not found", id)),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<CursorError> for ApiError {
    fn from(e: CursorError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(_: AuthError) -> Self {
        ApiError::Unauthorized
    }
}

impl From<CognitoError> for ApiError {
    fn from(e: CognitoError) -> Self {
        error!(error = %e, "Cognito error");
        let status =
            StatusCode::from_u16(e.status()).unwrap_or(StatusCode::BAD_GATEWAY);
        let message = match e {
            CognitoError::Service { message, .. } => message,
            other => other.to_string(),
        };
        ApiError::Provider { status, message }
    }
}
