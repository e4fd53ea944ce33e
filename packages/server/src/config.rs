use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use cognito::{AwsCredentials, CognitoOptions};
use harvester::{ConfigError, HttpClientConfig, ProxyConfig, ScrapeSettings, DEFAULT_KEYWORDS};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// PostgreSQL job table; in-memory store when unset
    pub database_url: Option<String>,
    pub aws_region: String,
    pub aws_user_pool_id: String,
    pub aws_user_pool_client_id: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    /// HS256 secret; replaces JWKS verification when set (tests, local dev)
    pub jwt_test_secret: Option<String>,
    pub proxy: Option<ProxyConfig>,
    pub timeout: Duration,
    pub scrape: ScrapeSettings,
    /// Cron expression for periodic scrapes
    pub scrape_schedule: Option<String>,
    pub scrape_keywords: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let proxy = proxy_config(
            optional("PROXIES"),
            optional("PROXY_USERNAME"),
            optional("PROXY_PASSWORD"),
        )?;

        let defaults = ScrapeSettings::default();
        let scrape = ScrapeSettings::default()
            .with_pages(parse_or("PAGES_TO_SCRAPE", defaults.pages_to_scrape)?)
            .with_timespan(optional("TIMESPAN").unwrap_or(defaults.timespan))
            .with_request_delay(Duration::from_secs(parse_or("REQUEST_DELAY", 1u64)?))
            .with_default_author(optional("AUTHOR").unwrap_or(defaults.default_author))
            .with_location(optional("SCRAPE_LOCATION").unwrap_or(defaults.location));
        scrape.validate().context("Invalid scrape settings")?;

        Ok(Self {
            port: parse_or("PORT", 8080u16)?,
            database_url: optional("DATABASE_URL"),
            aws_region: optional("AWS_REGION").unwrap_or_else(|| "eu-central-1".to_string()),
            aws_user_pool_id: optional("AWS_USER_POOL_ID").unwrap_or_default(),
            aws_user_pool_client_id: optional("AWS_USER_POOL_CLIENT_ID").unwrap_or_default(),
            aws_access_key_id: optional("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: optional("AWS_SECRET_ACCESS_KEY"),
            aws_session_token: optional("AWS_SESSION_TOKEN"),
            jwt_test_secret: optional("JWT_TEST_SECRET"),
            proxy,
            timeout: Duration::from_secs(parse_or("TIMEOUT", 5u64)?),
            scrape,
            scrape_schedule: optional("SCRAPE_SCHEDULE"),
            scrape_keywords: optional("SCRAPE_KEYWORDS")
                .unwrap_or_else(|| DEFAULT_KEYWORDS.to_string()),
            allowed_origins: optional("ALLOWED_ORIGINS")
                .map(|s| split_csv(&s))
                .unwrap_or_default(),
        })
    }

    /// HTTP client settings for scrape runs.
    pub fn http_client_config(&self) -> HttpClientConfig {
        let config = HttpClientConfig::default().with_timeout(self.timeout);
        match &self.proxy {
            Some(proxy) => config.with_proxy(proxy.clone()),
            None => config,
        }
    }

    /// User-pool client options. Admin actions need the AWS key pair.
    pub fn cognito_options(&self) -> CognitoOptions {
        let options = CognitoOptions::new(
            self.aws_region.clone(),
            self.aws_user_pool_id.clone(),
            self.aws_user_pool_client_id.clone(),
        );
        match (&self.aws_access_key_id, &self.aws_secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => {
                options.with_credentials(AwsCredentials {
                    access_key_id: access_key_id.clone(),
                    secret_access_key: secret_access_key.clone(),
                    session_token: self.aws_session_token.clone(),
                })
            }
            _ => options,
        }
    }
}

/// Proxy settings from the raw variables.
///
/// Credentials must come as a pair, with or without a proxy list.
fn proxy_config(
    list: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> Result<Option<ProxyConfig>> {
    match list {
        Some(list) => Ok(Some(
            ProxyConfig::from_csv(&list, username, password)
                .context("Invalid proxy configuration")?,
        )),
        None if username.is_some() != password.is_some() => {
            Err(ConfigError::PartialProxyCredentials).context("Invalid proxy configuration")
        }
        None => {
            if username.is_some() {
                tracing::warn!("Proxy credentials set without PROXIES, ignoring them");
            }
            Ok(None)
        }
    }
}

/// Non-empty value of an environment variable.
fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(name) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a valid number, got {:?}", name, raw)),
        None => Ok(default),
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
