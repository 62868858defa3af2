//! Entry points used by the presentation layer.
//!
//! [`GameLibrary`] ties the fetchers, the reconciler and the store together.
//! Each call stands alone; the only coordination is joining the two fetchers
//! before reconciling.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::fetcher::{fetch_or_empty, lookup, Fetcher};
use crate::metrics::record_store_op;
use crate::normalize::parse_hours;
use crate::query::{run_query, GameQuery, GameRow};
use crate::reconcile::reconcile;
use crate::record::{GameRecord, PartialRecord, SourceKind};
use crate::store::{GameStore, GameUpdate, ImportBatch, InsertOutcome, Mutation, StoreError};

/// Errors surfaced by library entry points.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Which sources a search consults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSelector {
    Hltb,
    Completionator,
    #[default]
    Both,
}

impl SourceSelector {
    pub fn includes(&self, source: SourceKind) -> bool {
        match self {
            SourceSelector::Both => true,
            SourceSelector::Hltb => source == SourceKind::Hltb,
            SourceSelector::Completionator => source == SourceKind::Completionator,
        }
    }
}

impl FromStr for SourceSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "hltb" => Ok(SourceSelector::Hltb),
            "b" | "completionator" => Ok(SourceSelector::Completionator),
            "both" => Ok(SourceSelector::Both),
            other => Err(format!("unknown source '{}'", other)),
        }
    }
}

impl fmt::Display for SourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceSelector::Hltb => "hltb",
            SourceSelector::Completionator => "completionator",
            SourceSelector::Both => "both",
        };
        f.write_str(s)
    }
}

/// Hand-entered game. Durations are raw text, validated on add.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEntry {
    pub name: String,
    pub main: String,
    pub main_plus: String,
    pub completionist: String,
    #[serde(default)]
    pub hltb_url: Option<String>,
    #[serde(default)]
    pub completionator_url: Option<String>,
}

/// Outcome of [`GameLibrary::search_and_store`] and [`GameLibrary::add_manual`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    Inserted { record: GameRecord },
    /// Stored data was left as it was.
    AlreadyExists { name: String },
    /// No source returned anything worth storing.
    NoData { name: String },
}

/// Outcome of [`GameLibrary::refresh`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Updated { record: GameRecord },
    /// The refetch produced nothing; stored data is unchanged.
    NoData { name: String },
    NotFound { name: String },
}

/// Totals of a [`GameLibrary::refresh_all`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub updated: usize,
    pub no_data: usize,
    pub not_found: usize,
}

/// The game list.
pub struct GameLibrary {
    store: Arc<dyn GameStore>,
    hltb: Arc<dyn Fetcher>,
    completionator: Arc<dyn Fetcher>,
}

impl GameLibrary {
    pub fn new(
        store: Arc<dyn GameStore>,
        hltb: Arc<dyn Fetcher>,
        completionator: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            store,
            hltb,
            completionator,
        }
    }

    /// Search the selected sources and insert the result if the name is new.
    #[instrument(skip(self))]
    pub async fn search_and_store(
        &self,
        name: &str,
        sources: SourceSelector,
    ) -> Result<SearchOutcome, LibraryError> {
        let name = validate_name(name)?;

        let (a, b) = tokio::join!(
            self.lookup_if(SourceKind::Hltb, sources, name),
            self.lookup_if(SourceKind::Completionator, sources, name),
        );

        let Some(record) = reconcile(&a, &b, name) else {
            info!(name, %sources, "No data found");
            return Ok(SearchOutcome::NoData {
                name: name.to_string(),
            });
        };

        self.insert(record)
    }

    /// Refetch a stored game and overwrite its URLs and durations.
    ///
    /// Sources with a stored URL are fetched directly; the others are
    /// searched again by name.
    #[instrument(skip(self))]
    pub async fn refresh(&self, name: &str) -> Result<RefreshOutcome, LibraryError> {
        let stored = match self.store.get(name) {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                info!(name, "Refresh requested for unknown game");
                record_store_op("refresh", "not_found");
                return Ok(RefreshOutcome::NotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(self.store_failed("refresh", e)),
        };

        let (a, b) = tokio::join!(
            self.refetch(self.hltb.as_ref(), &stored),
            self.refetch(self.completionator.as_ref(), &stored),
        );

        let Some(fresh) = reconcile(&a, &b, &stored.name) else {
            warn!(name, "Refresh found no data, keeping stored values");
            return Ok(RefreshOutcome::NoData {
                name: name.to_string(),
            });
        };

        let record = GameRecord {
            name: stored.name.clone(),
            favorite: stored.favorite,
            hltb_url: fresh.hltb_url.or(stored.hltb_url),
            completionator_url: fresh.completionator_url.or(stored.completionator_url),
            main: fresh.main,
            main_plus: fresh.main_plus,
            completionist: fresh.completionist,
        };

        match self.store.update(&GameUpdate::from(&record)) {
            Ok(Mutation::Applied { .. }) => {
                record_store_op("refresh", "ok");
                info!(name, "Refreshed game");
                Ok(RefreshOutcome::Updated { record })
            }
            // Deleted while the fetch was in flight.
            Ok(Mutation::NotFound) => {
                record_store_op("refresh", "not_found");
                Ok(RefreshOutcome::NotFound {
                    name: name.to_string(),
                })
            }
            Err(e) => Err(self.store_failed("refresh", e)),
        }
    }

    /// Refresh every stored game, one after another.
    pub async fn refresh_all(&self) -> Result<RefreshSummary, LibraryError> {
        let names = self
            .store
            .names()
            .map_err(|e| self.store_failed("refresh_all", e))?;

        let mut summary = RefreshSummary::default();
        for name in names {
            match self.refresh(&name).await? {
                RefreshOutcome::Updated { .. } => summary.updated += 1,
                RefreshOutcome::NoData { .. } => summary.no_data += 1,
                RefreshOutcome::NotFound { .. } => summary.not_found += 1,
            }
        }

        info!(
            updated = summary.updated,
            no_data = summary.no_data,
            not_found = summary.not_found,
            "Refreshed all games"
        );
        Ok(summary)
    }

    /// Validate and insert a hand-entered game.
    pub fn add_manual(&self, entry: ManualEntry) -> Result<SearchOutcome, LibraryError> {
        let name = validate_name(&entry.name)?;

        // Blank is a missing field; `--` is how an unknown time is entered.
        let hours = |field: &str, text: &str| {
            if text.trim().is_empty() {
                return Err(LibraryError::Validation(format!("{}: required", field)));
            }
            parse_hours(text)
                .map_err(|e| LibraryError::Validation(format!("{}: {}", field, e)))
        };

        let record = GameRecord {
            main: hours("main", &entry.main)?,
            main_plus: hours("main_plus", &entry.main_plus)?,
            completionist: hours("completionist", &entry.completionist)?,
            hltb_url: non_blank(entry.hltb_url, name, "hltb_url"),
            completionator_url: non_blank(entry.completionator_url, name, "completionator_url"),
            ..GameRecord::new(name)
        };
        if !record.has_measured_duration() {
            return Err(LibraryError::Validation(
                "at least one duration must be known".to_string(),
            ));
        }

        self.insert(record)
    }

    pub fn get(&self, name: &str) -> Result<Option<GameRecord>, LibraryError> {
        self.store.get(name).map_err(|e| self.store_failed("get", e))
    }

    /// Flip a game's favorite flag. `None` if the game is not stored.
    pub fn toggle_favorite(&self, name: &str) -> Result<Option<bool>, LibraryError> {
        let toggled = self
            .store
            .toggle_favorite(name)
            .map_err(|e| self.store_failed("toggle_favorite", e))?;
        record_store_op(
            "toggle_favorite",
            if toggled.is_some() { "ok" } else { "not_found" },
        );
        Ok(toggled)
    }

    pub fn remove(&self, name: &str) -> Result<Mutation, LibraryError> {
        let mutation = self
            .store
            .delete(name)
            .map_err(|e| self.store_failed("delete", e))?;
        record_store_op(
            "delete",
            if mutation.is_applied() { "ok" } else { "not_found" },
        );
        Ok(mutation)
    }

    pub fn remove_all(&self) -> Result<usize, LibraryError> {
        let removed = self
            .store
            .delete_all()
            .map_err(|e| self.store_failed("delete_all", e))?;
        record_store_op("delete_all", "ok");
        info!(removed, "Removed all games");
        Ok(removed)
    }

    pub fn query(&self, query: &GameQuery) -> Result<Vec<GameRow>, LibraryError> {
        let rows = self
            .store
            .rows()
            .map_err(|e| self.store_failed("query", e))?;
        Ok(run_query(rows, query))
    }

    /// Atomically insert already-decoded rows.
    pub fn bulk_import(&self, batch: &ImportBatch) -> Result<usize, LibraryError> {
        let imported = self
            .store
            .import(batch)
            .map_err(|e| self.store_failed("import", e))?;
        record_store_op("import", "ok");
        Ok(imported)
    }

    async fn lookup_if(
        &self,
        source: SourceKind,
        selector: SourceSelector,
        name: &str,
    ) -> PartialRecord {
        if !selector.includes(source) {
            return PartialRecord::empty(source);
        }
        lookup(self.fetcher(source), name).await
    }

    async fn refetch(&self, fetcher: &dyn Fetcher, stored: &GameRecord) -> PartialRecord {
        match stored.url_for(fetcher.source()) {
            Some(url) => fetch_or_empty(fetcher, url).await,
            None => lookup(fetcher, &stored.name).await,
        }
    }

    fn fetcher(&self, source: SourceKind) -> &dyn Fetcher {
        match source {
            SourceKind::Hltb => self.hltb.as_ref(),
            SourceKind::Completionator => self.completionator.as_ref(),
        }
    }

    fn insert(&self, record: GameRecord) -> Result<SearchOutcome, LibraryError> {
        match self.store.insert(&record) {
            Ok(InsertOutcome::Inserted) => {
                record_store_op("insert", "ok");
                info!(name = %record.name, "Stored game");
                Ok(SearchOutcome::Inserted { record })
            }
            Ok(InsertOutcome::AlreadyExists) => {
                record_store_op("insert", "skipped");
                Ok(SearchOutcome::AlreadyExists { name: record.name })
            }
            Err(e) => Err(self.store_failed("insert", e)),
        }
    }

    fn store_failed(&self, op: &str, error: StoreError) -> LibraryError {
        record_store_op(op, "error");
        warn!(op, error = %error, "Store operation failed");
        LibraryError::Storage(error)
    }
}

fn validate_name(name: &str) -> Result<&str, LibraryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LibraryError::Validation(
            "name must not be empty".to_string(),
        ));
    }
    Ok(name)
}

fn non_blank(url: Option<String>, name: &str, field: &str) -> Option<String> {
    match url.map(|u| u.trim().to_string()) {
        Some(u) if !u.is_empty() => Some(u),
        _ => {
            info!(name, field, "No URL given");
            None
        }
    }
}
