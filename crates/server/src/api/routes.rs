use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{games, handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Games
        .route(
            "/games",
            get(games::list_games)
                .post(games::search_game)
                .delete(games::remove_all_games),
        )
        .route("/games/manual", post(games::add_manual))
        .route("/games/import", post(games::import_games))
        .route("/games/refresh", post(games::refresh_all_games))
        .route(
            "/games/{name}",
            get(games::get_game).delete(games::remove_game),
        )
        .route("/games/{name}/refresh", post(games::refresh_game))
        .route("/games/{name}/favorite", post(games::toggle_favorite));

    Router::new()
        .route("/metrics", get(handlers::metrics))
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
