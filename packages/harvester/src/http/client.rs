//! reqwest-backed page fetcher with proxy rotation and retry/backoff.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, info, warn};
use url::Url;

use super::retry::RetryPolicy;
use super::PageFetcher;
use crate::error::{ConfigError, FetchError, FetchResult};
use crate::types::config::ProxyConfig;
use crate::types::page::Page;

/// Browser-like User-Agent; the guest job-search endpoints reject obvious bots.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Settings for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub proxy: Option<ProxyConfig>,
    /// Overall per-request timeout
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClientConfig {
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// One pooled reqwest client, bound to at most one proxy.
#[derive(Clone)]
struct Session {
    client: reqwest::Client,
    /// Proxy endpoint without credentials, for logging
    proxy: Option<String>,
}

/// HTTP client used by the scraper.
///
/// reqwest binds proxies to a client, so one client is built per proxy
/// endpoint up front and requests rotate over them round-robin, one proxy per
/// attempt. Without a proxy config there is a single direct client.
///
/// Sessions are released by [`close`](PageFetcher::close) or on drop,
/// whichever comes first.
pub struct HttpClient {
    sessions: RwLock<Option<Vec<Session>>>,
    cursor: AtomicUsize,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, ConfigError> {
        let sessions = match &config.proxy {
            Some(proxy_config) => proxy_config
                .proxy_list()
                .iter()
                .map(|endpoint| {
                    let client = Self::build_client(&config, Some((proxy_config, endpoint)))?;
                    Ok(Session {
                        client,
                        proxy: Some(ProxyConfig::endpoint_url(endpoint)),
                    })
                })
                .collect::<Result<Vec<_>, ConfigError>>()?,
            None => vec![Session {
                client: Self::build_client(&config, None)?,
                proxy: None,
            }],
        };

        info!(
            sessions = sessions.len(),
            timeout_secs = config.timeout.as_secs(),
            max_retries = config.retry.max_retries,
            "HTTP client ready"
        );

        Ok(Self {
            sessions: RwLock::new(Some(sessions)),
            cursor: AtomicUsize::new(0),
            retry: config.retry,
        })
    }

    fn build_client(
        config: &HttpClientConfig,
        proxy: Option<(&ProxyConfig, &String)>,
    ) -> Result<reqwest::Client, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5));

        if let Some((proxy_config, endpoint)) = proxy {
            let endpoint_url = ProxyConfig::endpoint_url(endpoint);
            let mut proxy =
                reqwest::Proxy::all(&endpoint_url).map_err(|e| ConfigError::InvalidProxy {
                    endpoint: endpoint_url.clone(),
                    reason: e.to_string(),
                })?;
            if let Some((user, pass)) = proxy_config.credentials() {
                proxy = proxy.basic_auth(user, pass);
            }
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(|e| ConfigError::InvalidSetting {
            name: "http_client",
            reason: e.to_string(),
        })
    }

    /// Next session in round-robin order.
    fn next_session(&self) -> FetchResult<Session> {
        let guard = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        let sessions = guard.as_ref().ok_or(FetchError::Closed)?;
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % sessions.len();
        Ok(sessions[index].clone())
    }

    fn validate_url(url: &str) -> FetchResult<()> {
        match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
            _ => Err(FetchError::InvalidUrl {
                url: url.to_string(),
            }),
        }
    }

    /// One attempt, no retries.
    async fn fetch_once(&self, url: &str) -> FetchResult<Page> {
        let session = self.next_session()?;
        debug!(url = %url, proxy = ?session.proxy, "Fetching page");

        let response = session
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, proxy = ?session.proxy, error = %e, "Request failed");
                FetchError::from_reqwest(url, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, proxy = ?session.proxy, status = %status, "HTTP error status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        Ok(Page::new(url, html))
    }

    pub fn is_closed(&self) -> bool {
        self.sessions
            .read()
            .map(|s| s.is_none())
            .unwrap_or(true)
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> FetchResult<Option<Page>> {
        Self::validate_url(url)?;
        self.retry.run(url, || self.fetch_once(url)).await
    }

    fn close(&self) {
        let mut guard = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if guard.take().is_some() {
            debug!("HTTP client sessions released");
        }
    }
}

impl Drop for HttpClient {
    fn drop(&mut self) {
        self.close();
    }
}
