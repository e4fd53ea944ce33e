//! Application setup and router configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use harvester::JobStore;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::domains::auth::{IdentityProvider, TokenVerifier};
use crate::kernel::ScrapeTrigger;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    admin_handler, change_password_handler, confirm_forgot_password_handler,
    confirm_sign_up_handler, create_job_handler, delete_job_handler, forgot_password_handler,
    get_job_handler, health_handler, list_all_jobs_handler, list_jobs_handler, me_handler,
    refresh_token_handler, resend_confirmation_code_handler, scrape_linkedin_handler,
    sign_in_handler, sign_out_handler, sign_up_handler, update_job_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub scraper: Arc<dyn ScrapeTrigger>,
}

/// Build the Axum application router
///
/// An empty `allowed_origins` allows any origin.
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    let auth_routes = Router::new()
        .route("/sign_up", post(sign_up_handler))
        .route("/sign_up/confirm", post(confirm_sign_up_handler))
        .route(
            "/confirmation_code/resend",
            post(resend_confirmation_code_handler),
        )
        .route("/sign_in", post(sign_in_handler))
        .route("/token/refresh", post(refresh_token_handler))
        .route("/forgot_password", post(forgot_password_handler))
        .route(
            "/forgot_password/confirm",
            post(confirm_forgot_password_handler),
        )
        .route("/change_password", post(change_password_handler))
        .route("/sign_out", post(sign_out_handler))
        .route("/me", get(me_handler))
        .route("/admin", get(admin_handler));

    let job_routes = Router::new()
        .route("/", post(create_job_handler).get(list_jobs_handler))
        .route("/all", get(list_all_jobs_handler))
        .route(
            "/:id",
            get(get_job_handler)
                .put(update_job_handler)
                .delete(delete_job_handler),
        );

    let verifier = state.verifier.clone();

    Router::new()
        .route("/api/health", get(health_handler))
        .nest("/api/auth", auth_routes)
        .nest("/api/jobs", job_routes)
        .route("/api/scrape/linkedin", get(scrape_linkedin_handler))
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(verifier.clone(), req, next)
        }))
        .layer(Extension(state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
