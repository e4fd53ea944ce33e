use axum::{
    extract::{Extension, Query},
    Json,
};
use harvester::DEFAULT_KEYWORDS;
use serde::Deserialize;

use crate::domains::auth::ADMIN_GROUP;
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;
use crate::server::routes::auth::MessageResponse;

#[derive(Debug, Default, Deserialize)]
pub struct ScrapeQuery {
    pub keywords: Option<String>,
}

/// Start a LinkedIn scrape in the background. Admin only.
///
/// Responds as soon as the run is spawned; the response says nothing about
/// how the run ends.
pub async fn scrape_linkedin_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    user.require_roles(&[ADMIN_GROUP])?;

    let keywords = query
        .keywords
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| DEFAULT_KEYWORDS.to_string());

    state.scraper.trigger(keywords.clone());

    Ok(MessageResponse::new(format!(
        "LinkedIn scraping started with keywords: {}",
        keywords
    )))
}
