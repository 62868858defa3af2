//! Testing utilities and mock implementations.
//!
//! [`MockFetcher`] stands in for a real source so the whole pipeline can be
//! exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use gamelist_core::testing::{fixtures, MockFetcher};
//!
//! let hltb = Arc::new(MockFetcher::new(SourceKind::Hltb));
//! let completionator = Arc::new(MockFetcher::new(SourceKind::Completionator));
//!
//! hltb.add_game("Celeste", fixtures::partial(SourceKind::Hltb, "Celeste", Some(8.0), None, None)).await;
//!
//! let library = GameLibrary::new(store, hltb.clone(), completionator.clone());
//! ```

mod mock_fetcher;

pub use mock_fetcher::MockFetcher;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::record::{PartialRecord, SourceKind};

    /// A scraped partial with a title and the given durations.
    pub fn partial(
        source: SourceKind,
        name: &str,
        main: Option<f64>,
        main_plus: Option<f64>,
        completionist: Option<f64>,
    ) -> PartialRecord {
        PartialRecord {
            source,
            name: Some(name.to_string()),
            url: None,
            main,
            main_plus,
            completionist,
        }
    }

    /// A HowLongToBeat game page with the given (label, value) time entries.
    pub fn hltb_page(title: &str, times: &[(&str, &str)]) -> String {
        let entries: String = times
            .iter()
            .map(|(label, value)| {
                format!(
                    r#"<li class="GameStats_short__tSJ6I time_100"><h4>{}</h4><h5>{}</h5></li>"#,
                    label, value
                )
            })
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html><head><title>{title} | HowLongToBeat</title></head>
<body>
  <div class="GameHeader_profile_header__q_PID shadow_text">{title}</div>
  <div class="GameStats_game_times__KHrRY shadow_shadow"><ul>{entries}</ul></div>
</body></html>"#
        )
    }

    /// A Completionator game details page with the given (label, value) stats.
    pub fn completionator_page(title: &str, stats: &[(&str, &str)]) -> String {
        let cells: String = stats
            .iter()
            .map(|(label, value)| {
                format!(
                    r#"<div class="col-6 text-center"><h5>{}</h5><h3>{}</h3></div>"#,
                    label, value
                )
            })
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html><head><title>{title} - Completionator</title></head>
<body>
  <h2 class="game-details-title">{title} <small>(2018)</small></h2>
  <div class="row"><div class="col-6"><a href="/Game/Edit">Edit</a></div></div>
  <div class="row">{cells}</div>
</body></html>"#
        )
    }
}
