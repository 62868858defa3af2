//! Completionator fetcher.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use super::page::{child_text, first_text, label_key, selector};
use super::{build_client, get_text, join_url, FetchError, Fetcher};
use crate::config::{HttpConfig, SourceConfig};
use crate::normalize::normalize;
use crate::record::{PartialRecord, SourceKind};

static TITLE: Lazy<Selector> = Lazy::new(|| selector("h2.game-details-title"));
static STATS: Lazy<Selector> = Lazy::new(|| selector("div.row div.col-6"));
static LABEL: Lazy<Selector> = Lazy::new(|| selector("h5"));
static VALUE: Lazy<Selector> = Lazy::new(|| selector("h3"));
static RESULT_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href*="/Game/Details/"]"#));

/// Scrape a Completionator game details page.
pub(super) fn parse_page(html: &str, url: &str) -> Result<PartialRecord, FetchError> {
    let document = Html::parse_document(html);
    let mut record = PartialRecord::empty(SourceKind::Completionator);
    record.name = document.select(&TITLE).next().and_then(first_text);

    let mut found_stats = false;
    for cell in document.select(&STATS) {
        let label = child_text(cell, &LABEL);
        if label.is_empty() {
            continue;
        }
        found_stats = true;
        let hours = normalize(&child_text(cell, &VALUE));

        match label_key(&label).as_str() {
            "core+few" => record.main = hours,
            "core+lots" => record.main_plus = hours,
            "completionated" => record.completionist = hours,
            "speedrun" => {}
            other => debug!(label = other, "Ignoring unknown Completionator category"),
        }
    }

    if record.name.is_none() && !found_stats {
        return Err(FetchError::MissingStructure {
            url: url.to_string(),
        });
    }

    record.url = Some(url.to_string());
    record.collapse_zeroes();
    Ok(record)
}

/// First game link on a search results page.
fn parse_search_page(html: &str, base_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&RESULT_LINK)
        .filter_map(|link| link.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(|href| join_url(base_url, href))
}

/// Completionator fetcher.
pub struct CompletionatorFetcher {
    client: Client,
    config: SourceConfig,
}

impl CompletionatorFetcher {
    pub fn new(config: SourceConfig, http: &HttpConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(http)?,
            config,
        })
    }
}

#[async_trait]
impl Fetcher for CompletionatorFetcher {
    fn source(&self) -> SourceKind {
        SourceKind::Completionator
    }

    async fn search(&self, name: &str) -> Result<Option<String>, FetchError> {
        let url = format!(
            "{}?search={}",
            join_url(&self.config.base_url, &self.config.search_path),
            urlencoding::encode(name)
        );
        debug!(url = %url, "Completionator search");

        let html = get_text(&self.client, &url).await?;
        Ok(parse_search_page(&html, &self.config.base_url))
    }

    async fn fetch(&self, url: &str) -> Result<PartialRecord, FetchError> {
        let html = get_text(&self.client, url).await?;
        parse_page(&html, url)
    }
}
