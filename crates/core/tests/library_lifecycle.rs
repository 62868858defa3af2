//! Game library lifecycle integration tests.
//!
//! These tests drive the library end to end against mock sources and an
//! on-disk database: search -> reconcile -> store -> query -> refresh -> delete.

use std::sync::Arc;

use tempfile::TempDir;

use gamelist_core::{
    testing::{fixtures, MockFetcher},
    GameLibrary, GameQuery, GameStore, ImportBatch, LibraryError, RefreshOutcome, SearchOutcome,
    SortField, SourceKind, SourceSelector, SqliteGameStore, StoreError,
};

/// Test helper holding the library and its collaborators.
struct TestHarness {
    store: Arc<SqliteGameStore>,
    hltb: Arc<MockFetcher>,
    completionator: Arc<MockFetcher>,
    library: GameLibrary,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(
            SqliteGameStore::new(temp_dir.path().join("games.db"))
                .expect("Failed to create game store"),
        );
        let hltb = Arc::new(MockFetcher::new(SourceKind::Hltb));
        let completionator = Arc::new(MockFetcher::new(SourceKind::Completionator));
        let library = GameLibrary::new(store.clone(), hltb.clone(), completionator.clone());

        Self {
            store,
            hltb,
            completionator,
            library,
            _temp_dir: temp_dir,
        }
    }

    async fn add_both(
        &self,
        name: &str,
        a: (Option<f64>, Option<f64>, Option<f64>),
        b: (Option<f64>, Option<f64>, Option<f64>),
    ) {
        self.hltb
            .add_game(name, fixtures::partial(SourceKind::Hltb, name, a.0, a.1, a.2))
            .await;
        self.completionator
            .add_game(
                name,
                fixtures::partial(SourceKind::Completionator, name, b.0, b.1, b.2),
            )
            .await;
    }
}

#[tokio::test]
async fn test_search_reconciles_both_sources() {
    let h = TestHarness::new();
    h.add_both(
        "Celeste",
        (Some(8.0), Some(12.0), None),
        (Some(7.5), Some(14.0), Some(38.0)),
    )
    .await;

    let outcome = h
        .library
        .search_and_store("Celeste", SourceSelector::Both)
        .await
        .unwrap();
    assert!(matches!(outcome, SearchOutcome::Inserted { .. }));

    let stored = h.store.get("Celeste").unwrap().unwrap();
    assert_eq!(stored.main, Some(8.0));
    assert_eq!(stored.main_plus, Some(14.0));
    assert_eq!(stored.completionist, Some(38.0));
    assert_eq!(
        stored.hltb_url.as_deref(),
        Some(h.hltb.url_for("Celeste").as_str())
    );
    assert_eq!(
        stored.completionator_url.as_deref(),
        Some(h.completionator.url_for("Celeste").as_str())
    );
}

#[tokio::test]
async fn test_rediscovery_leaves_stored_data_alone() {
    let h = TestHarness::new();
    h.add_both("Celeste", (Some(8.0), None, None), (None, None, None))
        .await;
    h.library
        .search_and_store("Celeste", SourceSelector::Both)
        .await
        .unwrap();
    assert_eq!(h.library.toggle_favorite("Celeste").unwrap(), Some(true));

    h.add_both("Celeste", (Some(99.0), None, None), (None, None, None))
        .await;
    let outcome = h
        .library
        .search_and_store("Celeste", SourceSelector::Both)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SearchOutcome::AlreadyExists {
            name: "Celeste".to_string()
        }
    );

    let stored = h.store.get("Celeste").unwrap().unwrap();
    assert_eq!(stored.main, Some(8.0));
    assert!(stored.favorite);
}

#[tokio::test]
async fn test_failing_source_does_not_fail_the_search() {
    let h = TestHarness::new();
    h.add_both("Hades", (Some(22.0), None, None), (Some(25.0), None, None))
        .await;
    h.hltb.set_failing(true).await;

    let outcome = h
        .library
        .search_and_store("Hades", SourceSelector::Both)
        .await
        .unwrap();

    match outcome {
        SearchOutcome::Inserted { record } => {
            assert_eq!(record.main, Some(25.0));
            assert_eq!(record.hltb_url, None);
        }
        other => panic!("expected insert, got {:?}", other),
    }
}

#[tokio::test]
async fn test_play_style_times_flow_through_to_the_store() {
    let h = TestHarness::new();
    let url = h.hltb.url_for("It Takes Two");
    h.hltb
        .add_game(
            "It Takes Two",
            fixtures::partial(SourceKind::Hltb, "It Takes Two", None, None, None),
        )
        .await;
    h.hltb
        .set_html(
            &url,
            &fixtures::hltb_page(
                "It Takes Two",
                &[("Single-Player", "10 Hours"), ("Co-Op", "14 Hours")],
            ),
        )
        .await;

    h.library
        .search_and_store("It Takes Two", SourceSelector::Hltb)
        .await
        .unwrap();

    let stored = h.store.get("It Takes Two").unwrap().unwrap();
    assert_eq!(stored.main, Some(14.0));
    assert_eq!(stored.main_plus, None);
}

#[tokio::test]
async fn test_refresh_overwrites_durations_but_keeps_favorite() {
    let h = TestHarness::new();
    h.add_both("Tunic", (Some(12.0), None, None), (Some(11.0), None, None))
        .await;
    h.library
        .search_and_store("Tunic", SourceSelector::Both)
        .await
        .unwrap();
    h.library.toggle_favorite("Tunic").unwrap();
    h.hltb.clear_recorded().await;

    h.add_both(
        "Tunic",
        (Some(13.0), Some(20.0), None),
        (Some(11.0), None, Some(30.0)),
    )
    .await;

    let outcome = h.library.refresh("Tunic").await.unwrap();
    let record = match outcome {
        RefreshOutcome::Updated { record } => record,
        other => panic!("expected update, got {:?}", other),
    };
    assert!(record.favorite);
    assert_eq!(record.main, Some(13.0));
    assert_eq!(record.main_plus, Some(20.0));
    assert_eq!(record.completionist, Some(30.0));

    // Stored URLs are fetched directly, no new search.
    assert!(h.hltb.recorded_searches().await.is_empty());
    assert_eq!(h.hltb.recorded_fetches().await, vec![h.hltb.url_for("Tunic")]);

    assert_eq!(h.store.get("Tunic").unwrap().unwrap(), record);
}

#[tokio::test]
async fn test_refresh_keeps_stored_name_when_page_has_no_title() {
    let h = TestHarness::new();
    h.hltb
        .add_game(
            "Celeste",
            fixtures::partial(SourceKind::Hltb, "Celeste", Some(8.0), None, None),
        )
        .await;
    h.library
        .search_and_store("Celeste", SourceSelector::Hltb)
        .await
        .unwrap();

    // Title markup gone, times block still there.
    h.hltb
        .set_html(
            &h.hltb.url_for("Celeste"),
            r#"<html><body>
                <div class="GameStats_game_times__x"><ul>
                    <li><h4>Main Story</h4><h5>10 Hours</h5></li>
                </ul></div>
            </body></html>"#,
        )
        .await;

    let outcome = h.library.refresh("Celeste").await.unwrap();
    let record = match outcome {
        RefreshOutcome::Updated { record } => record,
        other => panic!("expected update, got {:?}", other),
    };
    assert_eq!(record.name, "Celeste");
    assert_eq!(record.main, Some(10.0));
    assert_eq!(h.store.get("Celeste").unwrap().unwrap().main, Some(10.0));
}

#[tokio::test]
async fn test_search_stores_untitled_page_under_searched_name() {
    let h = TestHarness::new();
    h.completionator
        .add_game(
            "Inside",
            fixtures::partial(SourceKind::Completionator, "Inside", None, None, None),
        )
        .await;
    h.completionator
        .set_html(
            &h.completionator.url_for("Inside"),
            r#"<html><body>
                <div class="row"><div class="col-6"><h5>Core + Few</h5><h3>4 Hours</h3></div></div>
            </body></html>"#,
        )
        .await;

    let outcome = h
        .library
        .search_and_store("Inside", SourceSelector::Completionator)
        .await
        .unwrap();
    let record = match outcome {
        SearchOutcome::Inserted { record } => record,
        other => panic!("expected insert, got {:?}", other),
    };
    assert_eq!(record.name, "Inside");
    assert_eq!(record.main, Some(4.0));
}

#[tokio::test]
async fn test_refresh_searches_sources_without_url() {
    let h = TestHarness::new();
    h.hltb
        .add_game(
            "Inside",
            fixtures::partial(SourceKind::Hltb, "Inside", Some(3.5), None, None),
        )
        .await;
    h.library
        .search_and_store("Inside", SourceSelector::Hltb)
        .await
        .unwrap();

    h.completionator
        .add_game(
            "Inside",
            fixtures::partial(SourceKind::Completionator, "Inside", Some(4.0), None, None),
        )
        .await;

    let outcome = h.library.refresh("Inside").await.unwrap();
    assert!(matches!(outcome, RefreshOutcome::Updated { .. }));
    assert_eq!(
        h.completionator.recorded_searches().await,
        vec!["Inside".to_string()]
    );

    let stored = h.store.get("Inside").unwrap().unwrap();
    assert_eq!(stored.main, Some(4.0));
    assert!(stored.completionator_url.is_some());
}

#[tokio::test]
async fn test_refresh_with_no_data_keeps_stored_values() {
    let h = TestHarness::new();
    h.add_both("Limbo", (Some(4.0), None, None), (None, None, None))
        .await;
    h.library
        .search_and_store("Limbo", SourceSelector::Both)
        .await
        .unwrap();

    h.hltb.set_failing(true).await;
    h.completionator.set_failing(true).await;

    let outcome = h.library.refresh("Limbo").await.unwrap();
    assert!(matches!(outcome, RefreshOutcome::NoData { .. }));
    assert_eq!(h.store.get("Limbo").unwrap().unwrap().main, Some(4.0));
}

#[tokio::test]
async fn test_refresh_all_summary() {
    let h = TestHarness::new();
    h.add_both("Celeste", (Some(8.0), None, None), (None, None, None))
        .await;
    h.add_both("Hades", (Some(22.0), None, None), (None, None, None))
        .await;
    for name in ["Celeste", "Hades"] {
        h.library
            .search_and_store(name, SourceSelector::Both)
            .await
            .unwrap();
    }

    h.hltb
        .add_game(
            "Hades",
            fixtures::partial(SourceKind::Hltb, "Hades", None, None, None),
        )
        .await;

    let summary = h.library.refresh_all().await.unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.no_data, 1);
    assert_eq!(summary.not_found, 0);
}

#[tokio::test]
async fn test_query_orders_favorites_first() {
    let h = TestHarness::new();
    for (name, main) in [("Celeste", 8.0), ("Hades", 22.0), ("Inside", 3.5)] {
        h.hltb
            .add_game(name, fixtures::partial(SourceKind::Hltb, name, Some(main), None, None))
            .await;
        h.library
            .search_and_store(name, SourceSelector::Hltb)
            .await
            .unwrap();
    }
    h.library.toggle_favorite("Inside").unwrap();

    let rows = h
        .library
        .query(&GameQuery::new(SortField::Main, false, ""))
        .unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Inside", "Hades", "Celeste"]);
    assert_eq!(rows[0].main, "3.5");
    assert_eq!(rows[0].main_plus, "--");
}

#[test]
fn test_bulk_import_is_all_or_nothing() {
    let h = TestHarness::new();
    let header: Vec<String> = ["name", "main", "mainplus", "comp"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let row = |name: &str| vec![name.to_string(), "1".to_string(), String::new(), String::new()];

    let result = h.library.bulk_import(&ImportBatch::new(
        header.clone(),
        vec![row("A"), row("B"), row("A"), row("C"), row("D")],
    ));
    assert!(matches!(
        result,
        Err(LibraryError::Storage(StoreError::Transaction(_)))
    ));
    assert!(h.store.names().unwrap().is_empty());

    let imported = h
        .library
        .bulk_import(&ImportBatch::new(header, vec![row("A"), row("B")]))
        .unwrap();
    assert_eq!(imported, 2);
}

#[test]
fn test_remove_and_remove_all() {
    let h = TestHarness::new();
    let batch = ImportBatch::new(
        vec!["name".to_string(), "main".to_string()],
        vec![
            vec!["A".to_string(), "1".to_string()],
            vec!["B".to_string(), "2".to_string()],
        ],
    );
    h.library.bulk_import(&batch).unwrap();

    assert!(h.library.remove("A").unwrap().is_applied());
    assert!(!h.library.remove("A").unwrap().is_applied());
    assert_eq!(h.library.remove_all().unwrap(), 1);
}
