//! MySQL implementation of ArtifactSink.
//!
//! Writes into the operator application's database. Both tables are keyed by
//! thread id so repeated saves upsert.

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::Row;

use crate::config::DatabaseConfig;
use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::tools::Artifact;
use crate::ports::{ArtifactSink, ArtifactSinkError, ConversationRecord, StoredArtifacts};

const CREATE_CONVERSATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS idea_conversations (
    thread_id VARCHAR(128) NOT NULL PRIMARY KEY,
    user_id BIGINT NULL,
    title VARCHAR(255) NOT NULL,
    active_agent VARCHAR(64) NOT NULL,
    status VARCHAR(32) NOT NULL,
    message_count INT UNSIGNED NOT NULL,
    updated_at DATETIME(6) NOT NULL
)
"#;

const CREATE_ARTIFACTS: &str = r#"
CREATE TABLE IF NOT EXISTS idea_artifacts (
    thread_id VARCHAR(128) NOT NULL,
    kind VARCHAR(32) NOT NULL,
    user_id BIGINT NULL,
    content LONGTEXT NOT NULL,
    updated_at DATETIME(6) NOT NULL,
    PRIMARY KEY (thread_id, kind)
)
"#;

#[derive(Clone)]
pub struct MySqlArtifactSink {
    pool: MySqlPool,
}

impl MySqlArtifactSink {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Opens a pool from configuration. Connections are made lazily, so an
    /// unreachable database surfaces on first write rather than at startup.
    pub fn connect_lazy(config: &DatabaseConfig, url: &str) -> Result<Self, ArtifactSinkError> {
        let pool = MySqlPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy(url)
            .map_err(|e| ArtifactSinkError::Database(format!("Invalid database URL: {}", e)))?;
        Ok(Self::new(pool))
    }

    pub async fn ensure_schema(&self) -> Result<(), ArtifactSinkError> {
        for statement in [CREATE_CONVERSATIONS, CREATE_ARTIFACTS] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| ArtifactSinkError::Database(format!("Failed to create table: {}", e)))?;
        }
        Ok(())
    }
}

fn map_sqlx(context: &str, e: sqlx::Error) -> ArtifactSinkError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            ArtifactSinkError::Unavailable(format!("{}: {}", context, e))
        }
        other => ArtifactSinkError::Database(format!("{}: {}", context, other)),
    }
}

#[async_trait]
impl ArtifactSink for MySqlArtifactSink {
    async fn upsert_artifact(
        &self,
        conversation_id: &ConversationId,
        user_id: Option<UserId>,
        artifact: &Artifact,
    ) -> Result<(), ArtifactSinkError> {
        sqlx::query(
            r#"
            INSERT INTO idea_artifacts (thread_id, kind, user_id, content, updated_at)
            VALUES (?, ?, ?, ?, UTC_TIMESTAMP(6))
            ON DUPLICATE KEY UPDATE
                user_id = VALUES(user_id),
                content = VALUES(content),
                updated_at = VALUES(updated_at)
            "#,
        )
        .bind(conversation_id.as_str())
        .bind(artifact.kind.to_string())
        .bind(user_id.map(|u| u.value()))
        .bind(&artifact.content)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to upsert artifact", e))?;

        Ok(())
    }

    async fn record_conversation(&self, record: &ConversationRecord) -> Result<(), ArtifactSinkError> {
        sqlx::query(
            r#"
            INSERT INTO idea_conversations (
                thread_id, user_id, title, active_agent, status, message_count, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                user_id = COALESCE(VALUES(user_id), user_id),
                active_agent = VALUES(active_agent),
                status = VALUES(status),
                message_count = VALUES(message_count),
                updated_at = VALUES(updated_at)
            "#,
        )
        .bind(record.conversation_id.as_str())
        .bind(record.user_id.map(|u| u.value()))
        .bind(&record.title)
        .bind(record.active_agent.as_str())
        .bind(&record.status)
        .bind(record.message_count as u32)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to record conversation", e))?;

        Ok(())
    }

    async fn load_artifacts(&self, conversation_id: &ConversationId) -> Result<StoredArtifacts, ArtifactSinkError> {
        let rows = sqlx::query("SELECT kind, content FROM idea_artifacts WHERE thread_id = ?")
            .bind(conversation_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx("Failed to load artifacts", e))?;

        let mut stored = StoredArtifacts::default();
        for row in rows {
            let kind: String = row
                .try_get("kind")
                .map_err(|e| map_sqlx("Failed to read artifact kind", e))?;
            let content: String = row
                .try_get("content")
                .map_err(|e| map_sqlx("Failed to read artifact content", e))?;
            match kind.as_str() {
                "requirements" => stored.requirements = Some(content),
                "solution" => stored.solution = Some(content),
                other => tracing::warn!(kind = %other, "Ignoring unknown artifact kind"),
            }
        }
        Ok(stored)
    }
}
