//! HTTP surface tests driven through the full router with `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use idea_agent::adapters::ai::{FixedResolver, MockAIProvider, MockError};
use idea_agent::adapters::http::{api_router, AppState};
use idea_agent::adapters::knowledge::UnconfiguredKnowledgeBase;
use idea_agent::adapters::persistence::ArtifactCache;
use idea_agent::adapters::storage::InMemoryCheckpointStore;
use idea_agent::application::ConversationDriver;
use idea_agent::bootstrap::build_dispatcher;
use idea_agent::config::{AiConfig, EngineConfig, LockPolicy, ServerConfig};
use idea_agent::domain::agents::Workflow;
use idea_agent::domain::conversation::TurnKind;
use idea_agent::domain::foundation::ConversationId;
use idea_agent::ports::CheckpointStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with(provider: MockAIProvider, engine: EngineConfig) -> Router {
    app_with_store(provider, engine, InMemoryCheckpointStore::new())
}

fn app_with_store(provider: MockAIProvider, engine: EngineConfig, store: InMemoryCheckpointStore) -> Router {
    let cache = Arc::new(ArtifactCache::new());
    let resolver = Arc::new(FixedResolver::new(Arc::new(provider)));
    let dispatcher = build_dispatcher(cache.clone(), Arc::new(UnconfiguredKnowledgeBase), 3);
    let driver = Arc::new(ConversationDriver::new(
        Arc::new(store),
        resolver.clone(),
        Arc::new(dispatcher),
        cache.clone(),
        Arc::new(Workflow::reference().unwrap()),
        &engine,
    ));
    let state = AppState::new(driver, resolver, cache, &AiConfig::default());
    api_router(state, &ServerConfig::default())
}

fn app(provider: MockAIProvider) -> Router {
    app_with(provider, EngineConfig::default())
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn ask_without_thread_id_creates_one() {
    let store = InMemoryCheckpointStore::new();
    let app = app_with_store(
        MockAIProvider::new().with_response("What are you building?"),
        EngineConfig::default(),
        store.clone(),
    );

    let (status, body) = call(&app, "POST", "/ask", Some(json!({"question": "Hello", "user_id": 7}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "What are you building?");
    assert_eq!(body["status"], "completed");
    assert!(body.get("extracted_artifacts").is_none());

    let thread_id = ConversationId::parse(body["thread_id"].as_str().unwrap()).unwrap();
    let stored = store.find(&thread_id).await.unwrap().unwrap();
    let kinds: Vec<TurnKind> = stored.turns.iter().map(|t| t.kind()).collect();
    assert_eq!(kinds, vec![TurnKind::Human, TurnKind::AgentReply]);
}

#[tokio::test]
async fn conversation_endpoint_returns_the_transcript() {
    let app = app(
        MockAIProvider::new()
            .with_tool_call("save_requirements", json!({"requirements": "Shop with cart"}))
            .with_response("Plan ready."),
    );

    let (_, asked) = call(
        &app,
        "POST",
        "/ask",
        Some(json!({"question": "A shop", "thread_id": "shop-1"})),
    )
    .await;
    assert_eq!(asked["extracted_artifacts"]["requirements"], "Shop with cart");
    assert_eq!(asked["active_agent"], "developer");

    let (status, body) = call(&app, "GET", "/conversation/shop-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message_count"], 2);
    assert_eq!(
        body["messages"],
        json!([
            {"role": "user", "content": "A shop"},
            {"role": "assistant", "content": "Plan ready."}
        ])
    );

    let (status, body) = call(&app, "GET", "/conversation/shop-1/artifacts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requirements"], "Shop with cart");
    assert_eq!(body["solution"], Value::Null);
}

#[tokio::test]
async fn unknown_conversation_is_empty_not_missing() {
    let app = app(MockAIProvider::new());
    let (status, body) = call(&app, "GET", "/conversation/never-seen", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"], json!([]));
}

#[tokio::test]
async fn missing_credentials_answer_with_configuration_error() {
    let app = app(MockAIProvider::new().with_error(MockError::NotConfigured {
        message: "AI configuration not found.".to_string(),
    }));

    let (status, body) = call(
        &app,
        "POST",
        "/ask",
        Some(json!({"question": "Hi", "thread_id": "cfg-1"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "configuration_error");
    assert_eq!(body["thread_id"], "cfg-1");
    assert_eq!(body["retryable"], false);

    // Nothing was checkpointed for the failed turn.
    let (_, transcript) = call(&app, "GET", "/conversation/cfg-1", None).await;
    assert_eq!(transcript["message_count"], 0);
}

#[tokio::test]
async fn provider_outage_is_retryable() {
    let app = app(MockAIProvider::new().with_error(MockError::Unavailable {
        message: "overloaded".to_string(),
    }));

    let (status, body) = call(&app, "POST", "/ask", Some(json!({"question": "Hi"}))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "transient_error");
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn blank_question_is_invalid_request() {
    let app = app(MockAIProvider::new());
    let (status, body) = call(&app, "POST", "/ask", Some(json!({"question": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "invalid_request");
}

#[tokio::test]
async fn concurrent_message_is_rejected_as_busy() {
    let app = app_with(
        MockAIProvider::new().with_delay(Duration::from_millis(300)),
        EngineConfig {
            lock_policy: LockPolicy::Reject,
            ..EngineConfig::default()
        },
    );

    let first = {
        let app = app.clone();
        tokio::spawn(async move {
            call(&app, "POST", "/ask", Some(json!({"question": "one", "thread_id": "busy-1"}))).await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (status, body) = call(
        &app,
        "POST",
        "/ask",
        Some(json!({"question": "two", "thread_id": "busy-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "busy");
    assert_eq!(body["retryable"], true);

    let (status, _) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn publish_uses_saved_requirements_and_reports_metadata() {
    let app = app(
        MockAIProvider::new()
            .with_tool_call("save_requirements", json!({"requirements": "Inventory system"}))
            .with_response("Noted.")
            .with_response("Step 1: install Laravel"),
    );
    call(
        &app,
        "POST",
        "/ask",
        Some(json!({"question": "Inventory", "thread_id": "pub-1"})),
    )
    .await;

    let (status, body) = call(&app, "POST", "/publish", Some(json!({"thread_id": "pub-1"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["solution"], "Step 1: install Laravel");
    assert_eq!(body["metadata"]["thread_id"], "pub-1");
    assert_eq!(body["metadata"]["is_republish"], false);
    assert_eq!(body["metadata"]["word_count"], 4);
    assert_eq!(body["metadata"]["model_used"], "mock-model-1");
    assert!(body["metadata"]["generated_at"].is_string());
}

#[tokio::test]
async fn republish_flags_the_request() {
    let app = app(MockAIProvider::new().with_response("Improved guide"));

    let (status, body) = call(
        &app,
        "POST",
        "/republish",
        Some(json!({"thread_id": "pub-2", "requirements": "A CRM"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["is_republish"], true);
    assert_eq!(body["metadata"]["char_count"], 14);
}

#[tokio::test]
async fn publish_without_requirements_is_invalid_request() {
    let app = app(MockAIProvider::new());
    let (status, body) = call(&app, "POST", "/publish", Some(json!({"thread_id": "empty"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "invalid_request");
    assert_eq!(body["thread_id"], "empty");
}
