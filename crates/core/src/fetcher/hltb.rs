//! HowLongToBeat fetcher.
//!
//! Search goes through the site's JSON search endpoint; game pages are
//! scraped from HTML. The page's CSS module class names carry a build hash
//! suffix, so elements are matched on the stable prefix.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::header::REFERER;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::page::{child_text, first_text, label_key, selector};
use super::{build_client, get_text, join_url, FetchError, Fetcher};
use crate::config::{HttpConfig, SourceConfig};
use crate::normalize::normalize;
use crate::record::{max_hours, PartialRecord, SourceKind};

static TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"div[class*="GameHeader_profile_header"]"#));
static TIMES: Lazy<Selector> = Lazy::new(|| selector(r#"div[class*="GameStats_game_times"]"#));
static ENTRY: Lazy<Selector> = Lazy::new(|| selector("li"));
static LABEL: Lazy<Selector> = Lazy::new(|| selector("h4"));
static VALUE: Lazy<Selector> = Lazy::new(|| selector("h5"));

/// Time categories listed on a HowLongToBeat game page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    MainStory,
    MainSides,
    Completionist,
    /// Co-Op and Single-Player both feed the main story time.
    PlayStyle,
    /// Aggregates across play styles ("All Styles", "Vs.").
    Aggregate,
    Other,
}

impl Category {
    fn from_label(label: &str) -> Self {
        match label_key(label).as_str() {
            "main" | "mainstory" => Category::MainStory,
            "main+sides" | "main+extras" => Category::MainSides,
            "completionist" => Category::Completionist,
            "co-op" | "single-player" => Category::PlayStyle,
            "allstyles" | "vs." | "versus" => Category::Aggregate,
            _ => Category::Other,
        }
    }
}

/// Scrape a HowLongToBeat game page.
pub(super) fn parse_page(html: &str, url: &str) -> Result<PartialRecord, FetchError> {
    let document = Html::parse_document(html);
    let mut record = PartialRecord::empty(SourceKind::Hltb);
    record.name = document.select(&TITLE).next().and_then(first_text);

    let mut found_times = false;
    for list in document.select(&TIMES) {
        found_times = true;
        for entry in list.select(&ENTRY) {
            let label = child_text(entry, &LABEL);
            let hours = normalize(&child_text(entry, &VALUE));

            match Category::from_label(&label) {
                Category::MainStory => record.main = hours,
                Category::MainSides => record.main_plus = hours,
                Category::Completionist => record.completionist = hours,
                Category::PlayStyle => record.main = max_hours(record.main, hours),
                Category::Aggregate => {}
                Category::Other => debug!(label = %label, "Ignoring unknown HowLongToBeat category"),
            }
        }
    }

    if record.name.is_none() && !found_times {
        return Err(FetchError::MissingStructure {
            url: url.to_string(),
        });
    }

    record.url = Some(url.to_string());
    record.collapse_zeroes();
    Ok(record)
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    game_id: u64,
    #[serde(default)]
    game_name: String,
}

/// Pick the first search hit and turn it into a game page URL.
fn parse_search_response(body: &str, base_url: &str) -> Result<Option<String>, FetchError> {
    let response: SearchResponse = serde_json::from_str(body).map_err(|e| {
        FetchError::InvalidResponse(format!("Failed to parse HowLongToBeat search: {}", e))
    })?;

    Ok(response.data.first().map(|hit| {
        debug!(game_id = hit.game_id, game_name = %hit.game_name, "HowLongToBeat search hit");
        join_url(base_url, &format!("/game/{}", hit.game_id))
    }))
}

/// HowLongToBeat fetcher.
pub struct HltbFetcher {
    client: Client,
    config: SourceConfig,
}

impl HltbFetcher {
    pub fn new(config: SourceConfig, http: &HttpConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(http)?,
            config,
        })
    }
}

#[async_trait]
impl Fetcher for HltbFetcher {
    fn source(&self) -> SourceKind {
        SourceKind::Hltb
    }

    async fn search(&self, name: &str) -> Result<Option<String>, FetchError> {
        let url = join_url(&self.config.base_url, &self.config.search_path);
        let terms: Vec<&str> = name.split_whitespace().collect();
        let body = json!({
            "searchType": "games",
            "searchTerms": terms,
            "searchPage": 1,
            "size": 20,
            "searchOptions": {
                "games": {
                    "userId": 0,
                    "platform": "",
                    "sortCategory": "popular",
                    "rangeCategory": "main",
                    "rangeTime": { "min": null, "max": null },
                    "gameplay": { "perspective": "", "flow": "", "genre": "" },
                    "modifier": ""
                },
                "filter": "",
                "sort": 0,
                "randomizer": 0
            }
        });

        debug!(url = %url, name, "HowLongToBeat search");

        let response = self
            .client
            .post(&url)
            .header(REFERER, self.config.base_url.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        parse_search_response(&text, &self.config.base_url)
    }

    async fn fetch(&self, url: &str) -> Result<PartialRecord, FetchError> {
        let html = get_text(&self.client, url).await?;
        parse_page(&html, url)
    }
}
