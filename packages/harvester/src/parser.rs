//! Job-card parser for LinkedIn guest search results.
//!
//! A search-results page is a list of cards. Each card is parsed on its own:
//! one malformed card, or one detail page that cannot be fetched, costs that
//! card only.
//!
//! Parsed DOMs (`scraper::Html`) are not `Send`. All DOM work happens in
//! synchronous helpers that return owned data, so the async parse stays
//! spawnable.

use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, error, info, warn};

use crate::error::CardError;
use crate::http::PageFetcher;
use crate::types::job::{Job, NewJob};
use crate::types::page::Page;

/// Placeholder when the detail page has no description container.
pub const DESCRIPTION_NOT_FOUND: &str = "Could not find Job Description";

/// Placeholder when the description container holds no readable text.
pub const DESCRIPTION_PARSE_ERROR: &str = "Error parsing job description";

const CARD_SELECTOR: &str = "div.base-search-card__info";
const TITLE_SELECTOR: &str = "h3";
const COMPANY_SELECTOR: &str = "a.hidden-nested-link";
const LOCATION_SELECTOR: &str = "span.job-search-card__location";
const LOGO_CLASS: &str = "artdeco-entity-image";
const LOGO_ATTR: &str = "data-delayed-url";
const JOB_ID_ATTR: &str = "data-entity-urn";
const DESCRIPTION_SELECTOR: &str = "div.description__text.description__text--rich";

/// Footer strings the provider appends to every description.
const BOILERPLATE: [&str; 2] = ["Show less", "Show more"];

/// Fields read from one card before the detail page is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFields {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub logo_url: Option<String>,
}

impl CardFields {
    pub fn job_url(&self) -> String {
        build_job_url(&self.job_id)
    }
}

/// Canonical detail-page URL for a provider job id.
pub fn build_job_url(job_id: &str) -> String {
    format!("https://www.linkedin.com/jobs/view/{}/", job_id)
}

/// Turns search-result pages into draft jobs.
pub struct JobCardParser<F: PageFetcher> {
    fetcher: F,
    default_author: String,
}

impl<F: PageFetcher> JobCardParser<F> {
    pub fn new(fetcher: F, default_author: impl Into<String>) -> Self {
        Self {
            fetcher,
            default_author: default_author.into(),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Parse every card on the page.
    ///
    /// Never fails: a page without cards yields an empty list and a bad card
    /// is logged and skipped.
    pub async fn parse_job_cards(&self, page: &Page) -> Vec<Job> {
        let cards = extract_cards(&page.html);
        if cards.is_empty() {
            info!(url = %page.url, "No jobs found on the page");
            return Vec::new();
        }

        let mut jobs = Vec::with_capacity(cards.len());
        for (index, card) in cards.into_iter().enumerate() {
            match card {
                Ok(fields) => match self.build_job(fields).await {
                    Ok(job) => jobs.push(job),
                    Err(e) => error!(url = %page.url, card = index, error = %e, "Error parsing job card"),
                },
                Err(e) => warn!(url = %page.url, card = index, error = %e, "Skipping malformed job card"),
            }
        }
        jobs
    }

    async fn build_job(&self, fields: CardFields) -> Result<Job, CardError> {
        let job_url = fields.job_url();
        let description = match self.fetcher.fetch(&job_url).await? {
            Some(detail) => parse_job_description(&detail.html),
            None => {
                warn!(job_id = %fields.job_id, url = %job_url, "Detail page unavailable, leaving description empty");
                String::new()
            }
        };

        debug!(job_id = %fields.job_id, title = %fields.title, "Parsed job card");

        Ok(Job::create(
            NewJob {
                title: fields.title,
                company: fields.company,
                location: fields.location,
                job_url,
                description,
                logo_url: fields.logo_url,
            },
            self.default_author.clone(),
        ))
    }
}

/// Read every job card on a search-results page.
///
/// Returns one entry per card marker, in document order.
pub fn extract_cards(html: &str) -> Vec<Result<CardFields, CardError>> {
    let Ok(card_selector) = Selector::parse(CARD_SELECTOR) else {
        error!(selector = CARD_SELECTOR, "Invalid card selector");
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&card_selector)
        .map(|card| extract_card(&document, card))
        .collect()
}

fn extract_card(document: &Html, card: ElementRef<'_>) -> Result<CardFields, CardError> {
    let container = card
        .parent()
        .and_then(ElementRef::wrap)
        .ok_or(CardError::MissingContainer)?;

    let job_id = container
        .value()
        .attr(JOB_ID_ATTR)
        .and_then(|urn| urn.rsplit(':').next())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(CardError::MissingJobId)?
        .to_string();

    Ok(CardFields {
        job_id,
        title: first_text(card, TITLE_SELECTOR),
        company: first_text(card, COMPANY_SELECTOR),
        location: first_text(card, LOCATION_SELECTOR),
        logo_url: preceding_logo(document, card),
    })
}

/// Whitespace-collapsed text of the first match, or empty.
fn first_text(scope: ElementRef<'_>, css: &str) -> String {
    let Ok(sel) = Selector::parse(css) else {
        return String::new();
    };
    scope
        .select(&sel)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Nearest logo image that precedes `card` in document order.
fn preceding_logo(document: &Html, card: ElementRef<'_>) -> Option<String> {
    let mut logo = None;
    for node in document.root_element().descendants() {
        if node.id() == card.id() {
            break;
        }
        if let Some(el) = ElementRef::wrap(node) {
            let value = el.value();
            if value.name() == "img" && value.classes().any(|c| c == LOGO_CLASS) {
                logo = value
                    .attr(LOGO_ATTR)
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(String::from);
            }
        }
    }
    logo
}

/// Clean description text from a job detail page.
///
/// Returns [`DESCRIPTION_NOT_FOUND`] when the container is missing and
/// [`DESCRIPTION_PARSE_ERROR`] when nothing is left of it once links, labels
/// and footers are stripped (client-rendered or truncated pages).
pub fn parse_job_description(html: &str) -> String {
    match try_parse_description(html) {
        Ok(Some(text)) => text,
        Ok(None) => DESCRIPTION_NOT_FOUND.to_string(),
        Err(reason) => {
            error!(error = %reason, "Error parsing job description");
            DESCRIPTION_PARSE_ERROR.to_string()
        }
    }
}

fn try_parse_description(html: &str) -> Result<Option<String>, String> {
    let sel = Selector::parse(DESCRIPTION_SELECTOR).map_err(|e| format!("{e:?}"))?;
    let document = Html::parse_document(html);
    let Some(container) = document.select(&sel).next() else {
        return Ok(None);
    };

    let mut lines = Vec::new();
    collect_text(container, false, &mut lines);

    let mut text = lines.join("\n").replace("::marker", "-");
    for footer in BOILERPLATE {
        text = text.replace(footer, "");
    }

    let cleaned = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "-")
        .collect::<Vec<_>>()
        .join("\n");
    if cleaned.is_empty() {
        return Err("description container has no text".to_string());
    }
    Ok(Some(cleaned))
}

/// Walk `element`, pushing one line per text run.
///
/// `span` and `a` subtrees are dropped. A list item inside a `ul` gets a
/// leading `"- "` on its first line.
fn collect_text(element: ElementRef<'_>, in_ul: bool, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let line = collapse_whitespace(text);
                if !line.is_empty() {
                    out.push(line);
                }
            }
            Node::Element(el) => {
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                match el.name() {
                    "span" | "a" | "script" | "style" => {}
                    "ul" => collect_text(child_ref, true, out),
                    "li" if in_ul => {
                        let mut item = Vec::new();
                        collect_text(child_ref, false, &mut item);
                        if let Some(first) = item.first_mut() {
                            *first = format!("- {}", first);
                        }
                        out.extend(item);
                    }
                    _ => collect_text(child_ref, in_ul, out),
                }
            }
            _ => {}
        }
    }
}
