//! Published game catalog endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use draftfun_core::detect;
use draftfun_core::repository::{GAME_PAGE_SIZE, GameRepository};
use draftfun_types::game::NewGame;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, Created};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub code: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub user_id: String,
    pub rating: u8,
}

/// POST /games
pub async fn publish(
    State(state): State<AppState>,
    Json(req): Json<PublishRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    if req.username.trim().is_empty() {
        return Err(AppError::Validation("username must not be empty".into()));
    }
    detect::validate_artifact(&req.code)
        .map_err(|e| AppError::Validation(format!("code is not a valid game page: {e}")))?;

    let game = state
        .games
        .insert(&NewGame {
            name: req.name,
            description: req.description,
            code: req.code,
            username: req.username,
        })
        .await?;
    tracing::info!(game_id = %game.id, name = %game.name, "game published");
    Ok(Created(ApiResponse::new(game)))
}

/// GET /games?page=N
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.games.list(query.page).await?;
    let has_more = page.has_more();
    let mut response = ApiResponse::new(page)
        .with_meta("page", json!(query.page))
        .with_meta("page_size", json!(GAME_PAGE_SIZE))
        .with_meta("has_more", json!(has_more));
    if has_more {
        response = response.with_links(json!({
            "next": format!("/api/v1/games?page={}", query.page + 1),
        }));
    }
    Ok(response)
}

/// GET /games/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let game = state
        .games
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("game {id}")))?;
    Ok(ApiResponse::new(game))
}

/// GET /games/{id}/code
///
/// Serve the raw HTML so it can be loaded straight into an iframe.
pub async fn get_code(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let game = state
        .games
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("game {id}")))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        game.code,
    )
        .into_response())
}

/// DELETE /games/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.games.delete(&id).await?;
    tracing::info!(game_id = %id, "game deleted");
    Ok(ApiResponse::new(json!({ "deleted": true })))
}

/// PUT /games/{id}/rating
pub async fn rate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RateRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id must not be empty".into()));
    }
    let rating = state
        .games
        .upsert_rating(&id, &req.user_id, req.rating)
        .await?;
    Ok(ApiResponse::new(rating))
}

/// GET /games/{id}/rating
pub async fn rating_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.games.rating_summary(&id).await?;
    Ok(ApiResponse::new(summary))
}
