//! Per-user AI settings fetched from the operator application.
//!
//! `GET {base_url}/api/internal/ai-settings` with a JSON body `{user_id}`
//! answers `{success, data: {provider, api_key, model?}}`. Successful answers
//! are cached per user; timeouts and connection failures are retried with a
//! growing per-attempt timeout.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::ports::{CredentialError, CredentialSource, ProviderKind, ProviderSettings};

const ATTEMPT_TIMEOUTS: [Duration; 3] = [
    Duration::from_secs(5),
    Duration::from_secs(10),
    Duration::from_secs(15),
];
const RETRY_PAUSE: Duration = Duration::from_secs(1);

pub struct LaravelCredentialSource {
    client: Client,
    base_url: String,
    cache_ttl: Duration,
    cache: RwLock<HashMap<UserId, (ProviderSettings, Instant)>>,
    retry_pause: Duration,
}

impl LaravelCredentialSource {
    pub fn new(base_url: impl Into<String>, cache_ttl: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache_ttl,
            cache: RwLock::new(HashMap::new()),
            retry_pause: RETRY_PAUSE,
        }
    }

    #[cfg(test)]
    fn without_retry_pause(mut self) -> Self {
        self.retry_pause = Duration::ZERO;
        self
    }

    fn settings_url(&self) -> String {
        format!("{}/api/internal/ai-settings", self.base_url)
    }

    async fn cached(&self, user: UserId) -> Option<ProviderSettings> {
        let cache = self.cache.read().await;
        cache
            .get(&user)
            .filter(|(_, stored_at)| stored_at.elapsed() < self.cache_ttl)
            .map(|(settings, _)| settings.clone())
    }

    async fn fetch(&self, user: UserId) -> Result<Option<ProviderSettings>, CredentialError> {
        let body = SettingsRequest {
            user_id: user.value(),
        };
        let mut last_error = None;

        for (attempt, timeout) in ATTEMPT_TIMEOUTS.iter().enumerate() {
            if attempt > 0 {
                tokio::time::sleep(self.retry_pause).await;
            }
            tracing::debug!(user_id = %user, attempt = attempt + 1, "Fetching AI settings");

            let response = match self
                .client
                .get(self.settings_url())
                .json(&body)
                .timeout(*timeout)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    tracing::warn!(user_id = %user, attempt = attempt + 1, error = %e, "AI settings request failed");
                    last_error = Some(e.to_string());
                    continue;
                }
                Err(e) => return Err(CredentialError::Unreachable(e.to_string())),
            };

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(CredentialError::InvalidResponse(format!(
                    "status {}: {}",
                    status, text
                )));
            }

            let envelope: SettingsEnvelope = response
                .json()
                .await
                .map_err(|e| CredentialError::InvalidResponse(e.to_string()))?;
            return envelope.into_settings();
        }

        Err(CredentialError::Unreachable(
            last_error.unwrap_or_else(|| "no attempt made".to_string()),
        ))
    }
}

#[async_trait]
impl CredentialSource for LaravelCredentialSource {
    async fn credentials_for(&self, user: UserId) -> Result<Option<ProviderSettings>, CredentialError> {
        if let Some(settings) = self.cached(user).await {
            tracing::debug!(user_id = %user, "Using cached AI settings");
            return Ok(Some(settings));
        }

        let settings = self.fetch(user).await?;
        if let Some(settings) = &settings {
            self.cache
                .write()
                .await
                .insert(user, (settings.clone(), Instant::now()));
        }
        Ok(settings)
    }
}

#[derive(Debug, Serialize)]
struct SettingsRequest {
    user_id: i64,
}

#[derive(Debug, Deserialize)]
struct SettingsEnvelope {
    #[serde(default)]
    success: bool,
    data: Option<SettingsData>,
}

#[derive(Debug, Deserialize)]
struct SettingsData {
    provider: String,
    api_key: String,
    #[serde(default)]
    model: Option<String>,
}

impl SettingsEnvelope {
    fn into_settings(self) -> Result<Option<ProviderSettings>, CredentialError> {
        let data = match (self.success, self.data) {
            (true, Some(data)) => data,
            _ => return Ok(None),
        };
        if data.api_key.trim().is_empty() {
            return Ok(None);
        }
        let kind: ProviderKind = data
            .provider
            .parse()
            .map_err(|e: crate::domain::foundation::ValidationError| {
                CredentialError::InvalidResponse(e.to_string())
            })?;

        let mut settings = ProviderSettings::new(kind, data.api_key);
        if let Some(model) = data.model.filter(|m| !m.trim().is_empty()) {
            settings = settings.with_model(model);
        }
        Ok(Some(settings))
    }
}
