//! HTTP adapter - REST API for the conversation engine.
//!
//! Each endpoint group has its own dto/handlers/routes module; [`api_router`]
//! merges them and applies the cross-cutting tower layers.

pub mod conversation;
pub mod error;
pub mod health;
pub mod publishing;
pub mod state;

use std::time::Duration;

use ::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use conversation::conversation_routes;
pub use error::{ApiError, ErrorBody};
pub use publishing::publishing_routes;
pub use state::AppState;

/// Every route, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .merge(conversation_routes())
        .merge(publishing_routes())
}

/// Complete application router with tracing, CORS, timeouts and request ids.
pub fn api_router(state: AppState, server: &ServerConfig) -> Router {
    routes()
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(build_cors_layer(&server.cors_origins_list()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// CORS from the configured origin list; an empty list allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::adapters::ai::{FixedResolver, MockAIProvider};
    use crate::adapters::persistence::ArtifactCache;
    use crate::adapters::storage::InMemoryCheckpointStore;
    use crate::application::{ConversationDriver, ToolDispatcher};
    use crate::config::{AiConfig, EngineConfig};
    use crate::domain::agents::Workflow;

    fn app(provider: MockAIProvider) -> Router {
        let resolver = Arc::new(FixedResolver::new(Arc::new(provider)));
        let sink = Arc::new(ArtifactCache::new());
        let driver = Arc::new(ConversationDriver::new(
            Arc::new(InMemoryCheckpointStore::new()),
            resolver.clone(),
            Arc::new(ToolDispatcher::default()),
            sink.clone(),
            Arc::new(Workflow::reference().unwrap()),
            &EngineConfig::default(),
        ));
        let state = AppState::new(driver, resolver, sink, &AiConfig::default());
        api_router(state, &ServerConfig::default())
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = send(app(MockAIProvider::new()), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "idea-agent");
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let response = app(MockAIProvider::new())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_request() {
        let response = app(MockAIProvider::new())
            .oneshot(
                Request::post("/ask")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "invalid_request");
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn unsupported_provider_is_invalid_request() {
        let (status, body) = send(
            app(MockAIProvider::new()),
            "POST",
            "/ask",
            Some(json!({
                "question": "hi",
                "thread_id": "t-1",
                "provider_config": {"provider": "gemini", "api_key": "k"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["thread_id"], "t-1");
    }

    #[tokio::test]
    async fn cancel_without_running_turn_reports_false() {
        let (status, body) =
            send(app(MockAIProvider::new()), "POST", "/conversation/t-1/cancel", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"thread_id": "t-1", "cancelled": false}));
    }

    #[test]
    fn cors_skips_invalid_origins() {
        let _layer = build_cors_layer(&["http://localhost:3000".to_string(), "bad\norigin".to_string()]);
    }
}
