//! Completion-time fetchers, one per source.
//!
//! A fetcher searches a source by game name, then scrapes the result page
//! into a [`PartialRecord`]. [`lookup`] and [`fetch_or_empty`] drive the
//! per-call state machine
//! (`Searching -> {Found -> Fetching -> Done, NotFound -> Done}`) and turn any
//! failure into an empty partial, so nothing a source does can fail the
//! pipeline.

mod completionator;
mod hltb;
mod page;

pub use completionator::CompletionatorFetcher;
pub use hltb::HltbFetcher;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::HttpConfig;
use crate::metrics::{FETCH_ATTEMPTS, FETCH_DURATION};
use crate::record::{PartialRecord, SourceKind};

/// Errors that can occur while talking to a source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (connection, timeout, body).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Source answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The page did not have the structure the scraper expects.
    #[error("Expected page structure missing on {url}")]
    MissingStructure { url: String },

    /// Search response could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A completion-time source.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Which source this fetcher scrapes.
    fn source(&self) -> SourceKind;

    /// Search the source by name, returning the best hit's page URL.
    async fn search(&self, name: &str) -> Result<Option<String>, FetchError>;

    /// Fetch and scrape a game page.
    async fn fetch(&self, url: &str) -> Result<PartialRecord, FetchError>;
}

/// Scrape a page with the parser for `source`.
pub fn parse_page(source: SourceKind, html: &str, url: &str) -> Result<PartialRecord, FetchError> {
    match source {
        SourceKind::Hltb => hltb::parse_page(html, url),
        SourceKind::Completionator => completionator::parse_page(html, url),
    }
}

/// Search then fetch. Never fails: problems are logged and yield an empty partial.
pub async fn lookup(fetcher: &dyn Fetcher, name: &str) -> PartialRecord {
    let source = fetcher.source();
    debug!(%source, name, "Searching");

    match fetcher.search(name).await {
        Ok(Some(url)) => {
            debug!(%source, name, url = %url, "Found");
            fetch_or_empty(fetcher, &url).await
        }
        Ok(None) => {
            info!(%source, name, "No search result");
            FETCH_ATTEMPTS
                .with_label_values(&[source.as_str(), "not_found"])
                .inc();
            PartialRecord::empty(source)
        }
        Err(e) => {
            warn!(%source, name, error = %e, "Search failed");
            FETCH_ATTEMPTS
                .with_label_values(&[source.as_str(), "error"])
                .inc();
            PartialRecord::empty(source)
        }
    }
}

/// Fetch a known page. Never fails: problems are logged and yield an empty partial.
pub async fn fetch_or_empty(fetcher: &dyn Fetcher, url: &str) -> PartialRecord {
    let source = fetcher.source();
    debug!(%source, url, "Fetching");

    let start = Instant::now();
    let result = fetcher.fetch(url).await;
    FETCH_DURATION
        .with_label_values(&[source.as_str()])
        .observe(start.elapsed().as_secs_f64());

    match result {
        Ok(partial) => {
            let outcome = if partial.is_empty() { "empty" } else { "success" };
            FETCH_ATTEMPTS
                .with_label_values(&[source.as_str(), outcome])
                .inc();
            debug!(%source, url, ?partial, "Done");
            partial
        }
        Err(e) => {
            warn!(%source, url, error = %e, "Fetch failed");
            FETCH_ATTEMPTS
                .with_label_values(&[source.as_str(), "error"])
                .inc();
            PartialRecord::empty(source)
        }
    }
}

/// Stand-in for a source switched off in the configuration.
#[derive(Debug, Clone, Copy)]
pub struct DisabledFetcher(pub SourceKind);

#[async_trait]
impl Fetcher for DisabledFetcher {
    fn source(&self) -> SourceKind {
        self.0
    }

    async fn search(&self, _name: &str) -> Result<Option<String>, FetchError> {
        Ok(None)
    }

    async fn fetch(&self, _url: &str) -> Result<PartialRecord, FetchError> {
        Ok(PartialRecord::empty(self.0))
    }
}

/// HTTP client shared by the requests of one fetcher.
fn build_client(http: &HttpConfig) -> Result<Client, FetchError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(http.timeout_secs as u64))
        .user_agent(http.user_agent.clone())
        .build()?;
    Ok(client)
}

/// GET a page body, treating non-2xx as an error.
async fn get_text(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

/// Join a site base URL with a path or absolute link.
fn join_url(base_url: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        link.trim_start_matches('/')
    )
}
