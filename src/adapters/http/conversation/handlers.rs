//! HTTP handlers for conversation endpoints.
//!
//! These handlers connect Axum routes to the conversation command and query
//! handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::{
    AskCommand, CancelTurnCommand, GetArtifactsQuery, GetConversationQuery,
};

use super::dto::{AskRequest, AskResponse};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::state::AppState;

// ════════════════════════════════════════════════════════════════════════════════
// POST /ask
// ════════════════════════════════════════════════════════════════════════════════

/// POST /ask - Send a human message and run agents until input is needed.
///
/// # Errors
/// - 400 invalid_request / configuration_error
/// - 409 busy: another message for the thread is in flight
/// - 422 loop_bound_exceeded
/// - 503 transient_error: provider or store temporarily failing
pub async fn ask(
    State(state): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let thread_id = req.thread_id.clone();

    let provider = match req.provider_config {
        Some(dto) => dto
            .into_settings()
            .map_err(|e| ApiError::new(thread_id.clone(), e.into()))?,
        None => None,
    };

    let command = AskCommand {
        question: req.question,
        thread_id: req.thread_id,
        user_id: req.user_id,
        provider,
    };

    let outcome = state.ask.handle(command).await?;
    Ok((StatusCode::OK, Json(AskResponse::from(outcome))))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /conversation/{thread_id}
// ════════════════════════════════════════════════════════════════════════════════

/// GET /conversation/{thread_id} - Human-visible transcript.
///
/// Unknown threads return an empty message list.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .conversations
        .handle(GetConversationQuery {
            thread_id: thread_id.clone(),
        })
        .await
        .map_err(|e| ApiError::new(Some(thread_id), e))?;
    Ok((StatusCode::OK, Json(view)))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /conversation/{thread_id}/cancel
// ════════════════════════════════════════════════════════════════════════════════

/// POST /conversation/{thread_id}/cancel - Stop the running turn, if any.
pub async fn cancel_turn(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .cancel
        .handle(CancelTurnCommand {
            thread_id: thread_id.clone(),
        })
        .map_err(|e| ApiError::new(Some(thread_id), e))?;
    Ok((StatusCode::OK, Json(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /conversation/{thread_id}/artifacts
// ════════════════════════════════════════════════════════════════════════════════

/// GET /conversation/{thread_id}/artifacts - Latest saved documents.
pub async fn get_artifacts(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .artifacts
        .handle(GetArtifactsQuery {
            thread_id: thread_id.clone(),
        })
        .await
        .map_err(|e| ApiError::new(Some(thread_id), e))?;
    Ok((StatusCode::OK, Json(view)))
}
