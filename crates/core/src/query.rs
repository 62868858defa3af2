//! Sorted, filtered projection of the stored games.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::{StoredRow, StoredValue};

/// Rendering of an unknown duration.
pub const UNKNOWN_CELL: &str = "--";

/// Field the query orders by after favorites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Name,
    Main,
    MainPlus,
    Completionist,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "main" => Ok(SortField::Main),
            "main_plus" | "mainplus" => Ok(SortField::MainPlus),
            "completionist" | "comp" => Ok(SortField::Completionist),
            other => Err(format!("unknown sort field '{}'", other)),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortField::Name => "name",
            SortField::Main => "main",
            SortField::MainPlus => "main_plus",
            SortField::Completionist => "completionist",
        };
        f.write_str(s)
    }
}

/// Parameters of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameQuery {
    #[serde(default)]
    pub field: SortField,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
    /// Case-insensitive substring of the name; empty matches everything.
    #[serde(default)]
    pub filter: String,
}

fn default_ascending() -> bool {
    true
}

impl Default for GameQuery {
    fn default() -> Self {
        Self {
            field: SortField::Name,
            ascending: true,
            filter: String::new(),
        }
    }
}

impl GameQuery {
    pub fn new(field: SortField, ascending: bool, filter: impl Into<String>) -> Self {
        Self {
            field,
            ascending,
            filter: filter.into(),
        }
    }
}

/// Comparison key for one cell.
///
/// Classes order as SQLite orders storage classes (NULL, then numbers, then
/// text). Text made only of ASCII digits compares as a number.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Unknown,
    Number(f64),
    Text(String),
}

impl SortKey {
    fn for_duration(value: &StoredValue) -> Self {
        match value {
            StoredValue::Null => SortKey::Unknown,
            StoredValue::Integer(i) if *i < 0 => SortKey::Unknown,
            StoredValue::Real(r) if *r < 0.0 => SortKey::Unknown,
            StoredValue::Integer(i) => SortKey::Number(*i as f64),
            StoredValue::Real(r) => SortKey::Number(*r),
            StoredValue::Text(t) => Self::for_text(t),
        }
    }

    fn for_text(text: &str) -> Self {
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = text.parse::<f64>() {
                return SortKey::Number(n);
            }
        }
        SortKey::Text(text.to_string())
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Unknown => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// One line of query output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRow {
    pub name: String,
    pub favorite: bool,
    pub main: String,
    pub main_plus: String,
    pub completionist: String,
}

/// Render a stored duration cell. Numbers use the shortest form that reads
/// back exactly (`8`, `12.5`).
pub fn format_cell(value: &StoredValue) -> String {
    match value {
        StoredValue::Text(t) => t.clone(),
        other => match other.as_hours() {
            Some(hours) => hours.to_string(),
            None => UNKNOWN_CELL.to_string(),
        },
    }
}

fn key_for(row: &StoredRow, field: SortField) -> SortKey {
    match field {
        SortField::Name => SortKey::for_text(&row.name),
        SortField::Main => SortKey::for_duration(&row.main),
        SortField::MainPlus => SortKey::for_duration(&row.main_plus),
        SortField::Completionist => SortKey::for_duration(&row.completionist),
    }
}

/// Favorites first, then `query.field` in the requested direction.
///
/// `rows` are expected in name order; ties keep that order.
pub fn run_query(rows: Vec<StoredRow>, query: &GameQuery) -> Vec<GameRow> {
    // A blank filter matches everything; otherwise its text is matched as given.
    let filter = (!query.filter.trim().is_empty()).then(|| query.filter.to_lowercase());

    let mut keyed: Vec<(SortKey, StoredRow)> = rows
        .into_iter()
        .filter(|row| match &filter {
            Some(filter) => row.name.to_lowercase().contains(filter.as_str()),
            None => true,
        })
        .map(|row| (key_for(&row, query.field), row))
        .collect();

    keyed.sort_by(|(ka, a), (kb, b)| {
        let by_field = if query.ascending {
            ka.compare(kb)
        } else {
            kb.compare(ka)
        };
        b.favorite.cmp(&a.favorite).then(by_field)
    });

    keyed
        .into_iter()
        .map(|(_, row)| GameRow {
            main: format_cell(&row.main),
            main_plus: format_cell(&row.main_plus),
            completionist: format_cell(&row.completionist),
            favorite: row.favorite,
            name: row.name,
        })
        .collect()
}
