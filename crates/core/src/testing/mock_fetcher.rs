//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::fetcher::{self, FetchError, Fetcher};
use crate::record::{PartialRecord, SourceKind};

/// What a mock page serves.
#[derive(Debug, Clone)]
enum MockPage {
    /// Already-scraped data.
    Record(PartialRecord),
    /// Raw HTML, run through the real parser for the source.
    Html(String),
}

/// Mock implementation of the Fetcher trait.
///
/// Provides controllable behavior for testing:
/// - Register games that a search will find
/// - Serve scraped records or raw HTML per URL
/// - Track searches and fetches for assertions
/// - Simulate source failures
///
/// # Example
///
/// ```rust,ignore
/// use gamelist_core::testing::{MockFetcher, fixtures};
///
/// let fetcher = MockFetcher::new(SourceKind::Hltb);
/// fetcher.add_game(
///     "Celeste",
///     fixtures::partial(SourceKind::Hltb, "Celeste", Some(8.0), Some(12.0), None),
/// ).await;
///
/// let url = fetcher.search("celeste").await?.unwrap();
/// let partial = fetcher.fetch(&url).await?;
/// assert_eq!(partial.main, Some(8.0));
/// ```
#[derive(Debug)]
pub struct MockFetcher {
    source: SourceKind,
    /// Lowercased name -> page URL.
    hits: Arc<RwLock<HashMap<String, String>>>,
    pages: Arc<RwLock<HashMap<String, MockPage>>>,
    /// When set, every search and fetch fails.
    failing: Arc<RwLock<bool>>,
    searches: Arc<RwLock<Vec<String>>>,
    fetches: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    /// Create a mock fetcher that finds nothing.
    pub fn new(source: SourceKind) -> Self {
        Self {
            source,
            hits: Arc::new(RwLock::new(HashMap::new())),
            pages: Arc::new(RwLock::new(HashMap::new())),
            failing: Arc::new(RwLock::new(false)),
            searches: Arc::new(RwLock::new(Vec::new())),
            fetches: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// The URL a registered game is served under.
    pub fn url_for(&self, name: &str) -> String {
        format!(
            "https://{}.mock/game/{}",
            self.source,
            name.trim().to_lowercase().replace(' ', "-")
        )
    }

    /// Make `name` searchable and serve `partial` at its URL.
    ///
    /// A partial without a URL gets the game's mock URL. Registering the same
    /// name again replaces the served data.
    pub async fn add_game(&self, name: &str, mut partial: PartialRecord) {
        let url = self.url_for(name);
        if partial.url.is_none() {
            partial.url = Some(url.clone());
        }
        self.hits
            .write()
            .await
            .insert(name.trim().to_lowercase(), url.clone());
        self.pages.write().await.insert(url, MockPage::Record(partial));
    }

    /// Stop `name` from being found by search. Its page stays reachable.
    pub async fn remove_hit(&self, name: &str) {
        self.hits.write().await.remove(&name.trim().to_lowercase());
    }

    /// Serve raw HTML at `url`.
    pub async fn set_html(&self, url: &str, html: &str) {
        self.pages
            .write()
            .await
            .insert(url.to_string(), MockPage::Html(html.to_string()));
    }

    /// Make every call fail (or succeed again).
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    /// Names searched so far, as given.
    pub async fn recorded_searches(&self) -> Vec<String> {
        self.searches.read().await.clone()
    }

    /// URLs fetched so far.
    pub async fn recorded_fetches(&self) -> Vec<String> {
        self.fetches.read().await.clone()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded(&self) {
        self.searches.write().await.clear();
        self.fetches.write().await.clear();
    }

    async fn check_failing(&self) -> Result<(), FetchError> {
        if *self.failing.read().await {
            return Err(FetchError::InvalidResponse(format!(
                "mock {} failure",
                self.source
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn source(&self) -> SourceKind {
        self.source
    }

    async fn search(&self, name: &str) -> Result<Option<String>, FetchError> {
        self.searches.write().await.push(name.to_string());
        self.check_failing().await?;

        let hits = self.hits.read().await;
        Ok(hits.get(&name.trim().to_lowercase()).cloned())
    }

    async fn fetch(&self, url: &str) -> Result<PartialRecord, FetchError> {
        self.fetches.write().await.push(url.to_string());
        self.check_failing().await?;

        let page = self.pages.read().await.get(url).cloned();
        match page {
            Some(MockPage::Record(partial)) => Ok(partial),
            Some(MockPage::Html(html)) => fetcher::parse_page(self.source, &html, url),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
