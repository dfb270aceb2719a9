//! HTTP handlers for the one-shot publishing endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::PublishSolutionCommand;

use super::dto::{PublishRequest, PublishResponse};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::state::AppState;

/// POST /publish - Generate the technical solution for a thread.
pub async fn publish(
    state: State<AppState>,
    body: Result<Json<PublishRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    run(state, body, false).await
}

/// POST /republish - Regenerate, asking the model to improve on the last one.
pub async fn republish(
    state: State<AppState>,
    body: Result<Json<PublishRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    run(state, body, true).await
}

async fn run(
    State(state): State<AppState>,
    body: Result<Json<PublishRequest>, JsonRejection>,
    is_republish: bool,
) -> Result<(StatusCode, Json<PublishResponse>), ApiError> {
    let Json(req) = body?;
    let thread_id = Some(req.thread_id.clone());

    let provider = match req.provider_config {
        Some(dto) => dto
            .into_settings()
            .map_err(|e| ApiError::new(thread_id.clone(), e.into()))?,
        None => None,
    };

    let result = state
        .publish
        .handle(PublishSolutionCommand {
            thread_id: req.thread_id,
            requirements: req.requirements,
            user_id: req.user_id,
            provider,
            is_republish,
        })
        .await
        .map_err(|e| ApiError::new(thread_id, e))?;

    Ok((StatusCode::OK, Json(PublishResponse::from(result))))
}
