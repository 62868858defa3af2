//! Game list API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use gamelist_core::{
    GameQuery, GameRecord, GameRow, ImportBatch, LibraryError, ManualEntry, Mutation,
    RefreshOutcome, RefreshSummary, SearchOutcome, SortField, SourceSelector, StoreError,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing games
#[derive(Debug, Deserialize)]
pub struct ListGamesParams {
    /// Sort field: name, main, main_plus, completionist
    pub sort: Option<String>,
    /// "asc" (default) or "desc"
    pub order: Option<String>,
    /// Case-insensitive name filter
    pub filter: Option<String>,
}

/// Request body for a search
#[derive(Debug, Deserialize)]
pub struct SearchGameBody {
    pub name: String,
    /// "hltb"/"a", "completionator"/"b" or "both"; defaults to the configured source
    pub source: Option<String>,
}

/// Response for listing games
#[derive(Debug, Serialize)]
pub struct ListGamesResponse {
    pub games: Vec<GameRow>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct FavoriteResponse {
    pub name: String,
    pub favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}

#[derive(Debug, Serialize)]
pub struct RemoveAllResponse {
    pub removed: usize,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error status with a JSON body
pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn not_found(name: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("Game not found: {}", name))
}

/// Map a library failure onto an HTTP status.
fn library_error(e: LibraryError) -> ApiError {
    let status = match &e {
        LibraryError::Validation(_) => StatusCode::BAD_REQUEST,
        LibraryError::Storage(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        LibraryError::Storage(StoreError::Transaction(_)) => StatusCode::CONFLICT,
        LibraryError::Storage(StoreError::InvalidImport(_))
        | LibraryError::Storage(StoreError::InvalidRecord(_)) => StatusCode::BAD_REQUEST,
        LibraryError::Storage(StoreError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %e, "Library operation failed");
    }
    api_error(status, e.to_string())
}

fn search_status(outcome: &SearchOutcome) -> StatusCode {
    match outcome {
        SearchOutcome::Inserted { .. } => StatusCode::CREATED,
        SearchOutcome::AlreadyExists { .. } => StatusCode::OK,
        SearchOutcome::NoData { .. } => StatusCode::NOT_FOUND,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// List games, favorites first
pub async fn list_games(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListGamesParams>,
) -> Result<Json<ListGamesResponse>, ApiError> {
    let field = match params.sort.as_deref() {
        Some(sort) => sort
            .parse::<SortField>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?,
        None => SortField::default(),
    };

    let ascending = match params.order.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("asc") => true,
        Some("desc") => false,
        Some(other) => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("order must be 'asc' or 'desc', got '{}'", other),
            ))
        }
    };

    let query = GameQuery::new(field, ascending, params.filter.unwrap_or_default());
    let games = state.library().query(&query).map_err(library_error)?;

    Ok(Json(ListGamesResponse {
        total: games.len(),
        games,
    }))
}

/// Search sources for a game and store it
pub async fn search_game(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchGameBody>,
) -> Result<(StatusCode, Json<SearchOutcome>), ApiError> {
    let sources = match body.source.as_deref() {
        Some(source) => source
            .parse::<SourceSelector>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?,
        None => state.config().library.default_source,
    };

    let outcome = state
        .library()
        .search_and_store(&body.name, sources)
        .await
        .map_err(library_error)?;

    Ok((search_status(&outcome), Json(outcome)))
}

/// Add a game by hand
pub async fn add_manual(
    State(state): State<Arc<AppState>>,
    Json(entry): Json<ManualEntry>,
) -> Result<(StatusCode, Json<SearchOutcome>), ApiError> {
    let outcome = state.library().add_manual(entry).map_err(library_error)?;
    Ok((search_status(&outcome), Json(outcome)))
}

/// Import a batch of rows; all or nothing
pub async fn import_games(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<ImportBatch>,
) -> Result<Json<ImportResponse>, ApiError> {
    let imported = state
        .library()
        .bulk_import(&batch)
        .map_err(library_error)?;
    Ok(Json(ImportResponse { imported }))
}

/// Refresh every stored game
pub async fn refresh_all_games(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshSummary>, ApiError> {
    let summary = state
        .library()
        .refresh_all()
        .await
        .map_err(library_error)?;
    Ok(Json(summary))
}

/// Get a game by name
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<GameRecord>, ApiError> {
    match state.library().get(&name) {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(not_found(&name)),
        Err(e) => Err(library_error(e)),
    }
}

/// Refetch a stored game
pub async fn refresh_game(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<RefreshOutcome>, ApiError> {
    match state.library().refresh(&name).await {
        Ok(RefreshOutcome::NotFound { .. }) => Err(not_found(&name)),
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => Err(library_error(e)),
    }
}

/// Flip a game's favorite flag
pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<FavoriteResponse>, ApiError> {
    match state.library().toggle_favorite(&name) {
        Ok(Some(favorite)) => Ok(Json(FavoriteResponse { name, favorite })),
        Ok(None) => Err(not_found(&name)),
        Err(e) => Err(library_error(e)),
    }
}

/// Delete a game
pub async fn remove_game(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    match state.library().remove(&name) {
        Ok(Mutation::Applied { .. }) => Ok(Json(SuccessResponse {
            message: format!("Removed {}", name),
        })),
        Ok(Mutation::NotFound) => Err(not_found(&name)),
        Err(e) => Err(library_error(e)),
    }
}

/// Delete every game
pub async fn remove_all_games(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RemoveAllResponse>, ApiError> {
    let removed = state.library().remove_all().map_err(library_error)?;
    Ok(Json(RemoveAllResponse { removed }))
}
