use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
}

/// Liveness check. Does not touch the job store.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "OK".to_string(),
    })
}
