//! Error responses shared by every endpoint.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::application::handlers::AskError;
use crate::application::EngineError;

/// JSON body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub response: String,
    pub thread_id: Option<String>,
    pub status: String,
    pub retryable: bool,
}

/// An engine failure on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub thread_id: Option<String>,
    pub error: EngineError,
}

impl ApiError {
    pub fn new(thread_id: Option<String>, error: EngineError) -> Self {
        Self { thread_id, error }
    }

    pub fn bad_request(thread_id: Option<String>, message: impl Into<String>) -> Self {
        Self::new(thread_id, EngineError::invalid_input(message))
    }

    pub fn status_code(&self) -> StatusCode {
        match &self.error {
            EngineError::Configuration(_) | EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EngineError::Busy(_) => StatusCode::CONFLICT,
            EngineError::LoopBoundExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let response = match &self.error {
            EngineError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        ErrorBody {
            response,
            thread_id: self.thread_id.clone(),
            status: self.error.status().to_string(),
            retryable: self.error.is_retryable(),
        }
    }
}

impl From<AskError> for ApiError {
    fn from(err: AskError) -> Self {
        Self::new(err.thread_id, err.error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(None, format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self.error {
            EngineError::Internal(msg) => {
                tracing::error!(thread_id = ?self.thread_id, error = %msg, "Internal error");
            }
            other if status.is_server_error() => {
                tracing::warn!(thread_id = ?self.thread_id, error = %other, "Request failed");
            }
            _ => {}
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationId;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (EngineError::Configuration("x".into()), StatusCode::BAD_REQUEST),
            (EngineError::invalid_input("x"), StatusCode::BAD_REQUEST),
            (
                EngineError::Busy(ConversationId::parse("t").unwrap()),
                StatusCode::CONFLICT,
            ),
            (
                EngineError::LoopBoundExceeded { limit: 10 },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (EngineError::transient("x"), StatusCode::SERVICE_UNAVAILABLE),
            (EngineError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(ApiError::new(None, error).status_code(), expected);
        }
    }

    #[test]
    fn internal_details_stay_in_the_logs() {
        let body = ApiError::new(Some("t-1".into()), EngineError::internal("pool exhausted")).body();
        assert_eq!(body.response, "An internal error occurred");
        assert_eq!(body.status, "internal_error");
        assert!(!body.retryable);
        assert_eq!(body.thread_id.as_deref(), Some("t-1"));
    }

    #[test]
    fn transient_errors_are_retryable() {
        let body = ApiError::new(None, EngineError::transient("AI provider error: 503")).body();
        assert!(body.retryable);
        assert_eq!(body.status, "transient_error");
    }
}
