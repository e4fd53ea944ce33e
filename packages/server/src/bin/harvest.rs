//! Command-line scrape runner.
//!
//! Runs one scrape synchronously and prints the report as JSON. With
//! `--dry-run` the jobs go to an in-memory store and are printed as well.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use harvester::{JobStore, MemoryJobStore, PostgresJobStore};
use serde_json::json;
use server_core::kernel::ScrapeLauncher;
use server_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "harvest")]
#[command(about = "Scrape job listings into the job store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scrape and print the report
    Scrape {
        /// Search keywords (defaults to SCRAPE_KEYWORDS)
        keywords: Option<String>,

        /// Number of result pages to request
        #[arg(long)]
        pages: Option<u32>,

        /// Keep results in memory instead of DATABASE_URL
        #[arg(long)]
        dry_run: bool,
    },

    /// Create the job table and its index
    Bootstrap,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,harvester=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Scrape {
            keywords,
            pages,
            dry_run,
        } => scrape(&config, keywords, pages, dry_run).await,
        Commands::Bootstrap => bootstrap(&config).await,
    }
}

async fn scrape(
    config: &Config,
    keywords: Option<String>,
    pages: Option<u32>,
    dry_run: bool,
) -> Result<()> {
    let keywords = keywords.unwrap_or_else(|| config.scrape_keywords.clone());
    let mut settings = config.scrape.clone();
    if let Some(pages) = pages {
        settings = settings.with_pages(pages);
    }

    if dry_run {
        let memory = Arc::new(MemoryJobStore::new());
        let store: Arc<dyn JobStore> = memory.clone();
        let launcher = ScrapeLauncher::new(settings, config.http_client_config(), store);
        let report = launcher.run(&keywords).await.context("Scrape failed")?;
        let output = json!({ "report": report, "jobs": memory.snapshot() });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let store: Arc<dyn JobStore> = Arc::new(open_store(config).await?);
    let launcher = ScrapeLauncher::new(settings, config.http_client_config(), store);
    let report = launcher.run(&keywords).await.context("Scrape failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_complete() {
        tracing::warn!(
            skipped = report.pages_skipped,
            failed = report.jobs_failed,
            "Scrape finished with gaps"
        );
    }
    Ok(())
}

async fn bootstrap(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    store
        .ensure_table()
        .await
        .context("Failed to create job table")?;
    println!("{}", json!({ "success": true, "message": "Job table ready" }));
    Ok(())
}

async fn open_store(config: &Config) -> Result<PostgresJobStore> {
    let Some(url) = config.database_url.as_deref() else {
        bail!("DATABASE_URL must be set (or pass --dry-run to scrape)");
    };
    PostgresJobStore::new(url)
        .await
        .context("Failed to connect to database")
}
