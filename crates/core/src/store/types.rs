//! Store types: errors, outcomes and the raw row shapes.

use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::parse_hours;
use crate::record::GameRecord;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened or prepared.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A batch was rolled back; nothing from it was written.
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// A single statement failed.
    #[error("Database error: {0}")]
    Database(String),

    /// The import header cannot be mapped onto the schema.
    #[error("Invalid import: {0}")]
    InvalidImport(String),

    /// The record cannot be stored as given.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Result of an insert-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertOutcome {
    Inserted,
    /// A record with this name was already stored and was left untouched.
    AlreadyExists,
}

/// Result of a mutation addressed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Applied { rows: usize },
    /// No row matched.
    NotFound,
}

impl Mutation {
    pub(crate) fn from_rows(rows: usize) -> Self {
        if rows == 0 {
            Mutation::NotFound
        } else {
            Mutation::Applied { rows }
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied { .. })
    }
}

/// Fields overwritten by a refresh. Name selects the row; favorite is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct GameUpdate {
    pub name: String,
    pub hltb_url: Option<String>,
    pub completionator_url: Option<String>,
    pub main: Option<f64>,
    pub main_plus: Option<f64>,
    pub completionist: Option<f64>,
}

impl From<&GameRecord> for GameUpdate {
    fn from(record: &GameRecord) -> Self {
        Self {
            name: record.name.clone(),
            hltb_url: record.hltb_url.clone(),
            completionator_url: record.completionator_url.clone(),
            main: record.main,
            main_plus: record.main_plus,
            completionist: record.completionist,
        }
    }
}

/// A cell as SQLite stored it.
///
/// Duration columns have REAL affinity, but imported or legacy rows can still
/// carry text, so the query layer needs the storage class.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl StoredValue {
    /// Interpret the cell as hours. Negative numbers (the legacy `-1` marker)
    /// and text that does not parse are unknown.
    pub fn as_hours(&self) -> Option<f64> {
        let hours = match self {
            StoredValue::Null => None,
            StoredValue::Integer(i) => Some(*i as f64),
            StoredValue::Real(r) => Some(*r),
            StoredValue::Text(t) => parse_hours(t).ok().flatten(),
        };
        hours.filter(|h| *h >= 0.0)
    }

    /// Interpret the cell as a flag.
    pub fn truthy(&self) -> bool {
        match self {
            StoredValue::Null => false,
            StoredValue::Integer(i) => *i != 0,
            StoredValue::Real(r) => *r != 0.0,
            StoredValue::Text(t) => matches!(t.trim().to_ascii_lowercase().as_str(), "1" | "true"),
        }
    }
}

impl From<ValueRef<'_>> for StoredValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null | ValueRef::Blob(_) => StoredValue::Null,
            ValueRef::Integer(i) => StoredValue::Integer(i),
            ValueRef::Real(r) => StoredValue::Real(r),
            ValueRef::Text(bytes) => StoredValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

/// One row of the games table with duration cells left raw.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub name: String,
    pub favorite: bool,
    pub main: StoredValue,
    pub main_plus: StoredValue,
    pub completionist: StoredValue,
}

/// Columns of the games table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    HltbUrl,
    CompletionatorUrl,
    Favorite,
    Main,
    MainPlus,
    Completionist,
}

impl Column {
    pub fn sql_name(&self) -> &'static str {
        match self {
            Column::Name => "name",
            Column::HltbUrl => "hltb_url",
            Column::CompletionatorUrl => "completionator_url",
            Column::Favorite => "favorite",
            Column::Main => "main",
            Column::MainPlus => "main_plus",
            Column::Completionist => "completionist",
        }
    }

    /// Map an import header onto a column. Exports of older databases used
    /// different names, which are accepted too.
    pub fn from_header(header: &str) -> Option<Self> {
        match header.trim().to_ascii_lowercase().as_str() {
            "name" => Some(Column::Name),
            "hltb_url" | "hltburl" | "url" | "source_a_url" => Some(Column::HltbUrl),
            "completionator_url" | "completionatorurl" | "source_b_url" => {
                Some(Column::CompletionatorUrl)
            }
            "favorite" => Some(Column::Favorite),
            "main" => Some(Column::Main),
            "main_plus" | "mainplus" => Some(Column::MainPlus),
            "completionist" | "comp" => Some(Column::Completionist),
            _ => None,
        }
    }
}

/// Already-decoded rows for a bulk import, positionally matching `header`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ImportBatch {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Resolve the header into columns.
    pub fn columns(&self) -> Result<Vec<Column>, StoreError> {
        if self.header.is_empty() {
            return Err(StoreError::InvalidImport("empty header".to_string()));
        }

        let mut columns = Vec::with_capacity(self.header.len());
        for name in &self.header {
            let column = Column::from_header(name)
                .ok_or_else(|| StoreError::InvalidImport(format!("unknown column '{}'", name)))?;
            if columns.contains(&column) {
                return Err(StoreError::InvalidImport(format!(
                    "column '{}' given twice",
                    column.sql_name()
                )));
            }
            columns.push(column);
        }

        if !columns.contains(&Column::Name) {
            return Err(StoreError::InvalidImport(
                "header has no name column".to_string(),
            ));
        }
        Ok(columns)
    }
}

/// Parse an imported favorite cell.
pub(crate) fn parse_favorite(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" => Some(false),
        "1" | "true" => Some(true),
        _ => None,
    }
}
