//! Durable game storage keyed by name.

mod sqlite;
mod types;

pub use sqlite::SqliteGameStore;
pub use types::{
    Column, GameUpdate, ImportBatch, InsertOutcome, Mutation, StoreError, StoredRow, StoredValue,
};

use crate::record::GameRecord;

/// Trait for game storage implementations.
///
/// Every call is independent: there is no transaction spanning calls.
pub trait GameStore: Send + Sync {
    /// Whether a game with this name is stored.
    fn exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Get a stored game by name.
    fn get(&self, name: &str) -> Result<Option<GameRecord>, StoreError>;

    /// Insert if absent. An existing record with the same name is never touched.
    fn insert(&self, record: &GameRecord) -> Result<InsertOutcome, StoreError>;

    /// Overwrite URLs and durations of an existing record.
    fn update(&self, update: &GameUpdate) -> Result<Mutation, StoreError>;

    /// Flip the favorite flag, returning the new value (`None` if not stored).
    fn toggle_favorite(&self, name: &str) -> Result<Option<bool>, StoreError>;

    /// Delete one game.
    fn delete(&self, name: &str) -> Result<Mutation, StoreError>;

    /// Delete every game, returning how many were removed.
    fn delete_all(&self) -> Result<usize, StoreError>;

    /// All stored names in name order.
    fn names(&self) -> Result<Vec<String>, StoreError>;

    /// All rows in name order, duration cells as stored.
    fn rows(&self) -> Result<Vec<StoredRow>, StoreError>;

    /// Insert a batch atomically: either every row is written or none is.
    fn import(&self, batch: &ImportBatch) -> Result<usize, StoreError>;
}
