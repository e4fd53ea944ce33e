//! Configuration types for the scraper.
//!
//! Constructed once at process start and passed to each component's
//! constructor. Nothing here is read from ambient global state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Rotating proxy pool with optional shared credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    proxies: Vec<String>,
    username: Option<String>,
    password: Option<String>,
}

impl ProxyConfig {
    /// Build from a list of endpoints.
    ///
    /// Entries are trimmed and blanks dropped. Fails if nothing is left or if
    /// only one of username/password is set.
    pub fn new<I, S>(
        proxies: I,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let proxies: Vec<String> = proxies
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        if proxies.is_empty() {
            return Err(ConfigError::EmptyProxyList);
        }

        let username = username.filter(|u| !u.is_empty());
        let password = password.filter(|p| !p.is_empty());
        if username.is_some() != password.is_some() {
            return Err(ConfigError::PartialProxyCredentials);
        }

        Ok(Self {
            proxies,
            username,
            password,
        })
    }

    /// Build from a comma-separated list, as found in environment variables.
    pub fn from_csv(
        proxies: &str,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::new(proxies.split(','), username, password)
    }

    pub fn proxy_list(&self) -> &[String] {
        &self.proxies
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }

    /// Endpoint URL with a scheme, defaulting to `http://`.
    pub fn endpoint_url(proxy: &str) -> String {
        if proxy.contains("://") {
            proxy.to_string()
        } else {
            format!("http://{}", proxy)
        }
    }

    /// Endpoint URL with credentials embedded, when configured.
    pub fn proxy_url(&self, proxy: &str) -> String {
        let endpoint = Self::endpoint_url(proxy);
        match self.credentials() {
            Some((user, pass)) => match endpoint.split_once("://") {
                Some((scheme, host)) => format!("{}://{}:{}@{}", scheme, user, pass, host),
                None => endpoint,
            },
            None => endpoint,
        }
    }
}

/// Knobs for one scrape run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSettings {
    /// Number of search-result pages to walk
    pub pages_to_scrape: u32,
    /// Location filter embedded in the search URL
    pub location: String,
    /// Recency window token, e.g. `r2592000` for the last 30 days
    pub timespan: String,
    /// Pause between successive search pages
    pub request_delay: Duration,
    /// Author recorded on every scraped job
    pub default_author: String,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            pages_to_scrape: 10,
            location: "Croatia".to_string(),
            timespan: "r2592000".to_string(),
            request_delay: Duration::from_secs(1),
            default_author: "Anonymous".to_string(),
        }
    }
}

impl ScrapeSettings {
    pub fn with_pages(mut self, pages: u32) -> Self {
        self.pages_to_scrape = pages;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_timespan(mut self, timespan: impl Into<String>) -> Self {
        self.timespan = timespan.into();
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = author.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_author.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "default_author",
                reason: "must not be empty".into(),
            });
        }
        if self.timespan.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "timespan",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}
