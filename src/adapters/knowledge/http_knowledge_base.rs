//! Retrieval service client.
//!
//! `POST {base_url}/search {query, k, index}` answering
//! `{results: [{content, source?, score?}]}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{KnowledgeBase, KnowledgeBaseError, KnowledgeSnippet};

pub struct HttpKnowledgeBase {
    client: Client,
    base_url: String,
    index: String,
}

impl HttpKnowledgeBase {
    pub fn new(
        base_url: impl Into<String>,
        index: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, KnowledgeBaseError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KnowledgeBaseError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            index: index.into(),
        })
    }
}

#[async_trait]
impl KnowledgeBase for HttpKnowledgeBase {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<KnowledgeSnippet>, KnowledgeBaseError> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&SearchRequest {
                query,
                k,
                index: &self.index,
            })
            .send()
            .await
            .map_err(|e| KnowledgeBaseError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KnowledgeBaseError::SearchFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| KnowledgeBaseError::SearchFailed(e.to_string()))?;

        let mut results = body.results;
        results.truncate(k);
        Ok(results)
    }
}

/// Stands in when no retrieval service is configured.
pub struct UnconfiguredKnowledgeBase;

#[async_trait]
impl KnowledgeBase for UnconfiguredKnowledgeBase {
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<KnowledgeSnippet>, KnowledgeBaseError> {
        Err(KnowledgeBaseError::Unavailable(
            "no retrieval service configured".to_string(),
        ))
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
    index: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<KnowledgeSnippet>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_search_server() -> String {
        let app = Router::new().route(
            "/search",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["index"], "laravel_docs");
                let k = body["k"].as_u64().unwrap_or(0) as usize;
                let results: Vec<Value> = (0..k + 1)
                    .map(|i| json!({"content": format!("{} #{}", body["query"].as_str().unwrap_or(""), i), "score": 0.9}))
                    .collect();
                Json(json!({ "results": results }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn search_returns_at_most_k_snippets() {
        let url = spawn_search_server().await;
        let kb = HttpKnowledgeBase::new(url, "laravel_docs", Duration::from_secs(5)).unwrap();

        let results = kb.search("queues", 3).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].content, "queues #0");
        assert_eq!(results[0].score, Some(0.9));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let kb = HttpKnowledgeBase::new("http://127.0.0.1:9", "laravel_docs", Duration::from_secs(2))
            .unwrap();
        assert!(matches!(
            kb.search("queues", 3).await,
            Err(KnowledgeBaseError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn unconfigured_knowledge_base_always_fails() {
        assert!(UnconfiguredKnowledgeBase.search("q", 3).await.is_err());
    }
}
