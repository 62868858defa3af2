//! Game records: the canonical persisted entity and single-source partials.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The external sites completion times are scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// HowLongToBeat.
    Hltb,
    /// Completionator.
    Completionator,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Hltb => "hltb",
            SourceKind::Completionator => "completionator",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Larger of two durations, where `None` loses to any measured value.
pub fn max_hours(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// A value counts as measured only when it is above zero.
fn is_measured(hours: Option<f64>) -> bool {
    hours.is_some_and(|h| h > 0.0)
}

/// A reconciled game, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Unique, immutable key.
    pub name: String,
    /// HowLongToBeat page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hltb_url: Option<String>,
    /// Completionator page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completionator_url: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    /// Main story hours (`None` = unknown).
    pub main: Option<f64>,
    /// Main story plus side content.
    pub main_plus: Option<f64>,
    /// Everything.
    pub completionist: Option<f64>,
}

impl GameRecord {
    /// A record with no URLs and every duration unknown.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hltb_url: None,
            completionator_url: None,
            favorite: false,
            main: None,
            main_plus: None,
            completionist: None,
        }
    }

    /// The stored page URL for a source.
    pub fn url_for(&self, source: SourceKind) -> Option<&str> {
        match source {
            SourceKind::Hltb => self.hltb_url.as_deref(),
            SourceKind::Completionator => self.completionator_url.as_deref(),
        }
    }

    pub fn has_measured_duration(&self) -> bool {
        is_measured(self.main) || is_measured(self.main_plus) || is_measured(self.completionist)
    }
}

/// What a single fetcher scraped for one game.
///
/// Durations are accumulated as `Option<f64>`; once a page has been read any
/// zero left over is collapsed to `None` (see [`PartialRecord::collapse_zeroes`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialRecord {
    pub source: SourceKind,
    /// Title as shown on the source page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Page the data was scraped from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub main: Option<f64>,
    pub main_plus: Option<f64>,
    pub completionist: Option<f64>,
}

impl PartialRecord {
    /// "This source produced nothing."
    pub fn empty(source: SourceKind) -> Self {
        Self {
            source,
            name: None,
            url: None,
            main: None,
            main_plus: None,
            completionist: None,
        }
    }

    /// No usable name and no measured duration.
    pub fn is_empty(&self) -> bool {
        let has_name = self.name.as_deref().is_some_and(|n| !n.trim().is_empty());
        !has_name
            && !is_measured(self.main)
            && !is_measured(self.main_plus)
            && !is_measured(self.completionist)
    }

    /// Turn durations still at zero into unknown.
    ///
    /// A source listing "0 Hours" is indistinguishable from one that listed
    /// nothing; both end up `None`.
    pub fn collapse_zeroes(&mut self) {
        for field in [&mut self.main, &mut self.main_plus, &mut self.completionist] {
            if *field == Some(0.0) {
                *field = None;
            }
        }
    }
}
