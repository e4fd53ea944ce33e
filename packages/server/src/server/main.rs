// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use cognito::CognitoClient;
use harvester::{JobStore, MemoryJobStore, PostgresJobStore};
use server_core::domains::auth::{HsVerifier, JwksVerifier, TokenVerifier};
use server_core::kernel::{start_scheduler, ScrapeLauncher};
use server_core::server::{build_app, AppState};
use server_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,harvester=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting job board API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let store: Arc<dyn JobStore> = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let store = PostgresJobStore::new(url)
                .await
                .context("Failed to open job table")?;
            tracing::info!("Database connected");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, jobs are kept in memory");
            Arc::new(MemoryJobStore::new())
        }
    };

    let cognito = CognitoClient::new(config.cognito_options());
    if config.aws_access_key_id.is_none() {
        tracing::warn!("AWS credentials not set, confirmed users will not be added to a group");
    }

    let verifier: Arc<dyn TokenVerifier> = match &config.jwt_test_secret {
        Some(secret) => {
            tracing::warn!("JWT_TEST_SECRET set, verifying HS256 test tokens");
            Arc::new(HsVerifier::new(
                secret,
                cognito.issuer(),
                config.aws_user_pool_client_id.clone(),
            ))
        }
        None => Arc::new(JwksVerifier::new(
            cognito.jwks_url(),
            cognito.issuer(),
            config.aws_user_pool_client_id.clone(),
        )),
    };

    let launcher = ScrapeLauncher::new(
        config.scrape.clone(),
        config.http_client_config(),
        store.clone(),
    );

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = match &config.scrape_schedule {
        Some(schedule) => Some(
            start_scheduler(schedule, launcher.clone(), config.scrape_keywords.clone())
                .await
                .context("Failed to start scrape scheduler")?,
        ),
        None => None,
    };

    let state = AppState {
        store,
        identity: Arc::new(cognito),
        verifier,
        scraper: Arc::new(launcher),
    };
    let app = build_app(state, &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/api/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
