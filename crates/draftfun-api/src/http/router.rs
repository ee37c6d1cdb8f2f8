//! HTTP router assembly.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers::{game, session};
use crate::state::AppState;

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/sessions", post(session::create_session))
        .route(
            "/sessions/{id}",
            get(session::get_session).delete(session::delete_session),
        )
        .route("/sessions/{id}/generate", post(session::generate))
        .route("/sessions/{id}/cancel", post(session::cancel))
        .route(
            "/sessions/{id}/runtime-error",
            post(session::report_runtime_error),
        )
        .route("/sessions/{id}/load/{game_id}", post(session::load_game))
        .route("/sessions/{id}/artifact", get(session::get_artifact))
        .route("/games", post(game::publish).get(game::list))
        .route("/games/{id}", get(game::get).delete(game::delete))
        .route("/games/{id}/code", get(game::get_code))
        .route(
            "/games/{id}/rating",
            put(game::rate).get(game::rating_summary),
        );

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
