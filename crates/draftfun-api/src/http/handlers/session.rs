//! Generation session endpoints, including the SSE streaming surface.

use std::convert::Infallible;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures_util::Stream;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use draftfun_core::session::{TurnOutcome, TurnUpdate};
use draftfun_types::llm::StreamEvent;
use draftfun_types::session::{EngineVariant, RuntimeError};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, Created};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub engine: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct RuntimeErrorRequest {
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

/// POST /sessions
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let variant = match req.engine.as_deref() {
        None => EngineVariant::default(),
        Some(s) => s
            .parse::<EngineVariant>()
            .map_err(|_| AppError::Validation(format!("unknown engine: {s}")))?,
    };
    let id = state
        .create_session(variant)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!(session_id = %id, engine = %variant, "session created");
    Ok(Created(ApiResponse::new(json!({
        "session_id": id,
        "engine": variant.to_string(),
    }))))
}

/// GET /sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state
        .session(&id)
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;
    let session = entry.session.lock().await;
    Ok(ApiResponse::new(json!({
        "session_id": session.id(),
        "engine": session.variant().to_string(),
        "mode": session.mode().to_string(),
        "generating": session.is_generating(),
        "window_len": session.window_len(),
        "has_artifact": session.last_artifact().is_some(),
        "staged_error": session.staged_error().map(|e| e.describe()),
    })))
}

/// GET /sessions/{id}/artifact
pub async fn get_artifact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let entry = state
        .session(&id)
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;
    let session = entry.session.lock().await;
    match session.last_artifact() {
        Some(artifact) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            artifact.to_string(),
        )
            .into_response()),
        None => Err(AppError::NotFound(format!(
            "session {id} has no committed artifact"
        ))),
    }
}

/// POST /sessions/{id}/generate
///
/// Streams the turn as Server-Sent Events. Only one turn can run per
/// session; a second request while one is in flight gets 409.
pub async fn generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<GenerateRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let entry = state
        .session(&id)
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;

    let guard = entry.session.clone().try_lock_owned().map_err(|_| {
        AppError::Session(draftfun_types::error::SessionError::InvalidState(
            "a generation is already in progress for this session".into(),
        ))
    })?;

    if req.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt must not be empty".into()));
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<TurnUpdate>();
    let prompt = req.prompt;
    let handle = tokio::spawn(async move {
        let mut guard = guard;
        guard.submit(&prompt, Some(tx)).await
    });

    let stream = async_stream::stream! {
        while let Some(update) = rx.recv().await {
            let event = match update {
                TurnUpdate::Frame(StreamEvent::Connected) => {
                    Event::default().event("connected").data("{}")
                }
                TurnUpdate::Frame(StreamEvent::TextDelta { text }) => Event::default()
                    .event("text_delta")
                    .data(json!({ "text": text }).to_string()),
                TurnUpdate::Frame(StreamEvent::ReasoningDelta { text }) => Event::default()
                    .event("reasoning_delta")
                    .data(json!({ "text": text }).to_string()),
                TurnUpdate::Frame(StreamEvent::Done) => continue,
                TurnUpdate::PlausiblyComplete => {
                    Event::default().event("complete").data("{}")
                }
            };
            yield Ok(event);
        }

        let terminal = match handle.await {
            Ok(Ok(TurnOutcome::Committed { artifact })) => Event::default()
                .event("committed")
                .data(json!({ "artifact_bytes": artifact.len() }).to_string()),
            Ok(Ok(TurnOutcome::Failed { error })) => Event::default()
                .event("failed")
                .data(json!({ "message": error.to_string() }).to_string()),
            Ok(Ok(TurnOutcome::Cancelled)) => {
                Event::default().event("cancelled").data("{}")
            }
            Ok(Err(e)) => Event::default()
                .event("error")
                .data(json!({ "message": e.to_string() }).to_string()),
            Err(e) => Event::default()
                .event("error")
                .data(json!({ "message": format!("turn task failed: {e}") }).to_string()),
        };
        yield Ok(terminal);
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15))))
}

/// POST /sessions/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state
        .session(&id)
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;
    let cancelled = entry.cancel.cancel();
    tracing::info!(session_id = %id, cancelled, "cancel requested");
    Ok(ApiResponse::new(json!({ "cancelled": cancelled })))
}

/// POST /sessions/{id}/runtime-error
///
/// Stage a runtime error report for the next turn. The most recent
/// report wins.
pub async fn report_runtime_error(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RuntimeErrorRequest>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state
        .session(&id)
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;
    let mut session = entry.session.try_lock().map_err(|_| {
        AppError::Session(draftfun_types::error::SessionError::InvalidState(
            "a generation is in progress; report the error after it finishes".into(),
        ))
    })?;
    if req.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".into()));
    }
    let prefill = session
        .report_runtime_error(RuntimeError::new(req.message).with_location(req.line, req.column));
    Ok(ApiResponse::new(json!({ "staged_prompt": prefill })))
}

/// POST /sessions/{id}/load/{game_id}
///
/// Seed the session with a previously published game so the next turn
/// edits it.
pub async fn load_game(
    State(state): State<AppState>,
    Path((id, game_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    use draftfun_core::repository::GameRepository;

    let entry = state
        .session(&id)
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;
    let game = state
        .games
        .get(&game_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("game {game_id}")))?;

    let mut session = entry.session.try_lock().map_err(|_| {
        AppError::Session(draftfun_types::error::SessionError::InvalidState(
            "a generation is already in progress for this session".into(),
        ))
    })?;
    session.load_existing(game.code)?;
    tracing::info!(session_id = %id, game_id = %game_id, "loaded game into session");
    Ok(ApiResponse::new(json!({
        "session_id": id,
        "game_id": game_id,
        "mode": session.mode().to_string(),
    })))
}

/// DELETE /sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if state.remove_session(&id) {
        Ok(ApiResponse::new(json!({ "deleted": true })))
    } else {
        Err(AppError::NotFound(format!("session {id}")))
    }
}
