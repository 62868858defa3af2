//! SQLite-backed game store implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info, warn};

use super::types::parse_favorite;
use super::{
    Column, GameStore, GameUpdate, ImportBatch, InsertOutcome, Mutation, StoreError, StoredRow,
    StoredValue,
};
use crate::record::GameRecord;

const SELECT_RECORD: &str = "SELECT name, hltb_url, completionator_url, favorite, main, main_plus, completionist FROM games";

/// SQLite-backed game store.
///
/// Holds only the database path; each operation opens its own connection and
/// drops it on return.
#[derive(Debug, Clone)]
pub struct SqliteGameStore {
    path: PathBuf,
}

impl SqliteGameStore {
    /// Create a store, creating the database file and table if needed.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { path: path.into() };
        store.connect()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path).map_err(|e| {
            StoreError::Unavailable(format!("{}: {}", self.path.display(), e))
        })?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(conn)
    }

    // An existing table is fine; only a failure to create it is fatal.
    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                name TEXT PRIMARY KEY NOT NULL,
                hltb_url TEXT,
                completionator_url TEXT,
                favorite INTEGER NOT NULL DEFAULT 0,
                main REAL,
                main_plus REAL,
                completionist REAL
            );
            "#,
        )
        .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<GameRecord> {
        let favorite = StoredValue::from(row.get_ref(3)?);
        Ok(GameRecord {
            name: row.get(0)?,
            hltb_url: row.get(1)?,
            completionator_url: row.get(2)?,
            favorite: favorite.truthy(),
            main: StoredValue::from(row.get_ref(4)?).as_hours(),
            main_plus: StoredValue::from(row.get_ref(5)?).as_hours(),
            completionist: StoredValue::from(row.get_ref(6)?).as_hours(),
        })
    }

    fn row_to_stored(row: &rusqlite::Row) -> rusqlite::Result<StoredRow> {
        Ok(StoredRow {
            name: row.get(0)?,
            favorite: StoredValue::from(row.get_ref(1)?).truthy(),
            main: row.get_ref(2)?.into(),
            main_plus: row.get_ref(3)?.into(),
            completionist: row.get_ref(4)?.into(),
        })
    }

    /// Convert one import row to bound values, or explain why it cannot be.
    fn import_values(columns: &[Column], row: &[String]) -> Result<Vec<Value>, String> {
        if row.len() != columns.len() {
            return Err(format!(
                "expected {} cells, found {}",
                columns.len(),
                row.len()
            ));
        }

        columns
            .iter()
            .zip(row)
            .map(|(column, cell)| {
                let cell = cell.trim();
                match column {
                    Column::Name if cell.is_empty() => Err("empty name".to_string()),
                    Column::Favorite => parse_favorite(cell)
                        .map(|f| Value::Integer(f as i64))
                        .ok_or_else(|| format!("invalid favorite '{}'", cell)),
                    _ if cell.is_empty() => Ok(Value::Null),
                    _ => Ok(Value::Text(cell.to_string())),
                }
            })
            .collect()
    }
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

impl GameStore for SqliteGameStore {
    fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let conn = self.connect()?;
        let found = conn
            .query_row("SELECT 1 FROM games WHERE name = ?", params![name], |_| Ok(()))
            .optional()
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    fn get(&self, name: &str) -> Result<Option<GameRecord>, StoreError> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("{} WHERE name = ?", SELECT_RECORD),
            params![name],
            Self::row_to_record,
        )
        .optional()
        .map_err(db_err)
    }

    fn insert(&self, record: &GameRecord) -> Result<InsertOutcome, StoreError> {
        if record.name.trim().is_empty() {
            return Err(StoreError::InvalidRecord("name must not be empty".to_string()));
        }

        let conn = self.connect()?;
        let rows = conn
            .execute(
                "INSERT INTO games (name, hltb_url, completionator_url, favorite, main, main_plus, completionist) \
                 VALUES (?, ?, ?, ?, ?, ?, ?) ON CONFLICT(name) DO NOTHING",
                params![
                    record.name,
                    record.hltb_url,
                    record.completionator_url,
                    record.favorite,
                    record.main,
                    record.main_plus,
                    record.completionist,
                ],
            )
            .map_err(db_err)?;

        if rows == 0 {
            info!(name = %record.name, "Game already stored, skipping insert");
            Ok(InsertOutcome::AlreadyExists)
        } else {
            debug!(name = %record.name, "Inserted game");
            Ok(InsertOutcome::Inserted)
        }
    }

    fn update(&self, update: &GameUpdate) -> Result<Mutation, StoreError> {
        let conn = self.connect()?;
        let rows = conn
            .execute(
                "UPDATE games SET hltb_url = ?, completionator_url = ?, main = ?, main_plus = ?, completionist = ? WHERE name = ?",
                params![
                    update.hltb_url,
                    update.completionator_url,
                    update.main,
                    update.main_plus,
                    update.completionist,
                    update.name,
                ],
            )
            .map_err(db_err)?;

        let mutation = Mutation::from_rows(rows);
        if mutation == Mutation::NotFound {
            info!(name = %update.name, "Update matched no game");
        }
        Ok(mutation)
    }

    fn toggle_favorite(&self, name: &str) -> Result<Option<bool>, StoreError> {
        let mut conn = self.connect()?;
        // Take the write lock up front so the read-then-write cannot fail on upgrade.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;

        let current = tx
            .query_row(
                "SELECT favorite FROM games WHERE name = ?",
                params![name],
                |row| Ok(StoredValue::from(row.get_ref(0)?).truthy()),
            )
            .optional()
            .map_err(db_err)?;

        let Some(current) = current else {
            info!(name, "Toggle favorite matched no game");
            return Ok(None);
        };

        let toggled = !current;
        tx.execute(
            "UPDATE games SET favorite = ? WHERE name = ?",
            params![toggled, name],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)?;

        Ok(Some(toggled))
    }

    fn delete(&self, name: &str) -> Result<Mutation, StoreError> {
        let conn = self.connect()?;
        let rows = conn
            .execute("DELETE FROM games WHERE name = ?", params![name])
            .map_err(db_err)?;

        let mutation = Mutation::from_rows(rows);
        if mutation == Mutation::NotFound {
            info!(name, "Delete matched no game");
        }
        Ok(mutation)
    }

    fn delete_all(&self) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM games", []).map_err(db_err)
    }

    fn names(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT name FROM games ORDER BY name")
            .map_err(db_err)?;
        let names = stmt
            .query_map([], |row| row.get(0))
            .map_err(db_err)?
            .collect::<Result<Vec<String>, _>>()
            .map_err(db_err)?;
        Ok(names)
    }

    fn rows(&self) -> Result<Vec<StoredRow>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT name, favorite, main, main_plus, completionist FROM games ORDER BY name",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], Self::row_to_stored)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    fn import(&self, batch: &ImportBatch) -> Result<usize, StoreError> {
        let columns = batch.columns()?;
        let sql = format!(
            "INSERT INTO games ({}) VALUES ({})",
            columns
                .iter()
                .map(Column::sql_name)
                .collect::<Vec<_>>()
                .join(", "),
            vec!["?"; columns.len()].join(", ")
        );

        let total = batch.rows.len();
        let aborted = || {
            StoreError::Transaction(format!(
                "import of {} rows rolled back, no rows were written",
                total
            ))
        };

        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(|_| aborted())?;
        {
            let mut stmt = tx.prepare(&sql).map_err(db_err)?;
            for (index, row) in batch.rows.iter().enumerate() {
                let values = Self::import_values(&columns, row).map_err(|reason| {
                    warn!(row = index + 1, reason = %reason, "Rejected import row");
                    aborted()
                })?;
                stmt.execute(params_from_iter(values.iter())).map_err(|e| {
                    warn!(row = index + 1, error = %e, "Import row failed");
                    aborted()
                })?;
            }
        }
        tx.commit().map_err(|_| aborted())?;

        info!(rows = total, "Imported games");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, SqliteGameStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteGameStore::new(dir.path().join("games.db")).unwrap();
        (dir, store)
    }

    fn record(name: &str, main: Option<f64>) -> GameRecord {
        GameRecord {
            hltb_url: Some(format!("https://howlongtobeat.com/game/{}", name.len())),
            main,
            ..GameRecord::new(name)
        }
    }

    fn batch(rows: &[&[&str]]) -> ImportBatch {
        ImportBatch::new(
            ["name", "url", "favorite", "main", "mainplus", "completionist"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_insert_and_get() {
        let (_dir, store) = create_test_store();
        let game = GameRecord {
            main_plus: Some(12.5),
            ..record("Celeste", Some(8.0))
        };

        assert_eq!(store.insert(&game).unwrap(), InsertOutcome::Inserted);
        assert!(store.exists("Celeste").unwrap());
        assert_eq!(store.get("Celeste").unwrap(), Some(game));
        assert_eq!(store.get("Hades").unwrap(), None);
    }

    #[test]
    fn test_insert_never_overwrites() {
        let (_dir, store) = create_test_store();
        store.insert(&record("Celeste", Some(8.0))).unwrap();
        assert_eq!(store.toggle_favorite("Celeste").unwrap(), Some(true));

        let outcome = store.insert(&record("Celeste", Some(99.0))).unwrap();
        assert_eq!(outcome, InsertOutcome::AlreadyExists);

        let stored = store.get("Celeste").unwrap().unwrap();
        assert_eq!(stored.main, Some(8.0));
        assert!(stored.favorite);
    }

    #[test]
    fn test_insert_rejects_blank_name() {
        let (_dir, store) = create_test_store();
        let result = store.insert(&GameRecord::new("  "));
        assert!(matches!(result, Err(StoreError::InvalidRecord(_))));
    }

    #[test]
    fn test_update_preserves_name_and_favorite() {
        let (_dir, store) = create_test_store();
        store.insert(&record("Hades", Some(20.0))).unwrap();
        store.toggle_favorite("Hades").unwrap();

        let update = GameUpdate {
            name: "Hades".to_string(),
            hltb_url: None,
            completionator_url: Some("https://completionator.com/Game/Details/1".to_string()),
            main: Some(22.0),
            main_plus: None,
            completionist: Some(95.0),
        };
        assert_eq!(store.update(&update).unwrap(), Mutation::Applied { rows: 1 });

        let stored = store.get("Hades").unwrap().unwrap();
        assert!(stored.favorite);
        assert_eq!(stored.hltb_url, None);
        assert_eq!(stored.main, Some(22.0));
        assert_eq!(stored.completionist, Some(95.0));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let (_dir, store) = create_test_store();
        let update = GameUpdate::from(&record("Ghost", Some(1.0)));
        assert_eq!(store.update(&update).unwrap(), Mutation::NotFound);
        assert!(!store.exists("Ghost").unwrap());
    }

    #[test]
    fn test_toggle_twice_restores_value() {
        let (_dir, store) = create_test_store();
        store.insert(&record("Tunic", Some(12.0))).unwrap();

        assert_eq!(store.toggle_favorite("Tunic").unwrap(), Some(true));
        assert_eq!(store.toggle_favorite("Tunic").unwrap(), Some(false));
        assert!(!store.get("Tunic").unwrap().unwrap().favorite);
        assert_eq!(store.toggle_favorite("Nope").unwrap(), None);
    }

    #[test]
    fn test_concurrent_toggles_all_apply() {
        let (_dir, store) = create_test_store();
        store.insert(&record("Tunic", Some(12.0))).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.toggle_favorite("Tunic"))
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().unwrap().is_some());
        }
        // Eight flips bring the flag back to where it started.
        assert!(!store.get("Tunic").unwrap().unwrap().favorite);
    }

    #[test]
    fn test_delete_and_delete_all() {
        let (_dir, store) = create_test_store();
        for name in ["A", "B", "C"] {
            store.insert(&record(name, Some(1.0))).unwrap();
        }

        assert_eq!(store.delete("B").unwrap(), Mutation::Applied { rows: 1 });
        assert_eq!(store.delete("B").unwrap(), Mutation::NotFound);
        assert_eq!(store.names().unwrap(), vec!["A", "C"]);
        assert_eq!(store.delete_all().unwrap(), 2);
        assert!(store.names().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_round_trips_as_null() {
        let (_dir, store) = create_test_store();
        store.insert(&record("Outer Wilds", None)).unwrap();

        let rows = store.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].main, StoredValue::Null);
        assert_eq!(store.get("Outer Wilds").unwrap().unwrap().main, None);
    }

    #[test]
    fn test_legacy_sentinel_reads_as_unknown() {
        let (dir, store) = create_test_store();
        let conn = Connection::open(dir.path().join("games.db")).unwrap();
        conn.execute(
            "INSERT INTO games (name, favorite, main, main_plus, completionist) VALUES ('Old', 0, -1, 5, -1)",
            [],
        )
        .unwrap();

        let old = store.get("Old").unwrap().unwrap();
        assert_eq!(old.main, None);
        assert_eq!(old.main_plus, Some(5.0));
        assert_eq!(old.completionist, None);
    }

    #[test]
    fn test_import_batch() {
        let (_dir, store) = create_test_store();
        let imported = store
            .import(&batch(&[
                &["Celeste", "https://howlongtobeat.com/game/1", "1", "8", "12.5", ""],
                &["Hades", "", "false", "22", "", "95"],
            ]))
            .unwrap();
        assert_eq!(imported, 2);

        let celeste = store.get("Celeste").unwrap().unwrap();
        assert!(celeste.favorite);
        assert_eq!(celeste.main_plus, Some(12.5));
        assert_eq!(celeste.completionist, None);

        let hades = store.get("Hades").unwrap().unwrap();
        assert_eq!(hades.hltb_url, None);
        assert_eq!(hades.completionist, Some(95.0));
    }

    #[test]
    fn test_import_rolls_back_whole_batch() {
        let (_dir, store) = create_test_store();
        store.insert(&record("Celeste", Some(8.0))).unwrap();

        let result = store.import(&batch(&[
            &["Hades", "", "0", "22", "", ""],
            &["Tunic", "", "0", "12", "", ""],
            &["Celeste", "", "0", "99", "", ""],
            &["Inside", "", "0", "4", "", ""],
            &["Limbo", "", "0", "5", "", ""],
        ]));

        assert!(matches!(result, Err(StoreError::Transaction(_))));
        assert_eq!(store.names().unwrap(), vec!["Celeste"]);
        assert_eq!(store.get("Celeste").unwrap().unwrap().main, Some(8.0));
    }

    #[test]
    fn test_import_rejects_malformed_rows() {
        let (_dir, store) = create_test_store();

        let short_row = store.import(&batch(&[&["Hades", "", "0", "22", ""]]));
        assert!(matches!(short_row, Err(StoreError::Transaction(_))));

        let bad_favorite = store.import(&batch(&[&["Hades", "", "yes", "22", "", ""]]));
        assert!(matches!(bad_favorite, Err(StoreError::Transaction(_))));

        assert!(store.names().unwrap().is_empty());
    }

    #[test]
    fn test_import_keeps_unparsed_text() {
        let (_dir, store) = create_test_store();
        store
            .import(&batch(&[&["Mystery", "", "0", "lots", "", ""]]))
            .unwrap();

        let rows = store.rows().unwrap();
        assert_eq!(rows[0].main, StoredValue::Text("lots".to_string()));
    }

    #[test]
    fn test_unavailable_store() {
        let dir = TempDir::new().unwrap();
        let result = SqliteGameStore::new(dir.path().join("missing").join("games.db"));
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_reopen_existing_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("games.db");
        {
            let store = SqliteGameStore::new(&path).unwrap();
            store.insert(&record("Celeste", Some(8.0))).unwrap();
        }

        let reopened = SqliteGameStore::new(&path).unwrap();
        assert!(reopened.exists("Celeste").unwrap());
    }
}
