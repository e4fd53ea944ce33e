//! Fetched HTML pages.

/// Raw HTML of a fetched page.
///
/// The body is kept as a string and parsed on demand: `scraper::Html` is not
/// `Send`, so parsed documents must not be held across an `.await` in tasks
/// that are spawned onto the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// URL the page was requested from
    pub url: String,
    /// Response body
    pub html: String,
}

impl Page {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}
