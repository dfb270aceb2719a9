//! Redis-backed Checkpoint Store Adapter
//!
//! One JSON document per conversation under `<prefix><conversation_id>`.
//! Appends run WATCH/MULTI on a dedicated connection so writers on other
//! instances cannot interleave with the read-modify-write.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::conversation::{ConversationState, Turn};
use crate::domain::foundation::ConversationId;
use crate::ports::{apply_append, CheckpointError, CheckpointStore, CheckpointUpdate};

const MAX_APPEND_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct RedisCheckpointStore {
    client: redis::Client,
    conn: MultiplexedConnection,
    key_prefix: String,
    connect_timeout: Duration,
}

impl RedisCheckpointStore {
    pub fn new(
        client: redis::Client,
        conn: MultiplexedConnection,
        key_prefix: impl Into<String>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            client,
            conn,
            key_prefix: key_prefix.into(),
            connect_timeout,
        }
    }

    /// Opens the client and the shared multiplexed connection, giving up
    /// after `connect_timeout`.
    pub async fn connect(
        url: &str,
        key_prefix: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, CheckpointError> {
        let client =
            redis::Client::open(url).map_err(|e| CheckpointError::unavailable(e.to_string()))?;
        let conn = within(connect_timeout, client.get_multiplexed_tokio_connection()).await?;
        Ok(Self::new(client, conn, key_prefix, connect_timeout))
    }

    fn key(&self, id: &ConversationId) -> String {
        format!("{}{}", self.key_prefix, id)
    }

    fn decode(id: &ConversationId, raw: Option<String>) -> Result<ConversationState, CheckpointError> {
        let raw = raw.ok_or_else(|| CheckpointError::NotFound(id.clone()))?;
        serde_json::from_str(&raw).map_err(|e| CheckpointError::serialization(e.to_string()))
    }
}

#[async_trait]
impl CheckpointStore for RedisCheckpointStore {
    async fn load(&self, id: &ConversationId) -> Result<ConversationState, CheckpointError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(self.key(id))
            .await
            .map_err(|e: redis::RedisError| CheckpointError::unavailable(e.to_string()))?;
        Self::decode(id, raw)
    }

    async fn save(&self, state: &ConversationState) -> Result<ConversationState, CheckpointError> {
        let mut stored = state.clone();
        stored.version += 1;
        stored.touch();
        let json =
            serde_json::to_string(&stored).map_err(|e| CheckpointError::serialization(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(self.key(&stored.conversation_id), json)
            .await
            .map_err(|e: redis::RedisError| CheckpointError::unavailable(e.to_string()))?;
        Ok(stored)
    }

    async fn append_and_save(
        &self,
        id: &ConversationId,
        turns: Vec<Turn>,
        update: CheckpointUpdate,
    ) -> Result<ConversationState, CheckpointError> {
        let key = self.key(id);
        // WATCH state is per connection; a shared multiplexed one would leak it.
        let mut conn = within(self.connect_timeout, self.client.get_async_connection()).await?;

        for _ in 0..MAX_APPEND_ATTEMPTS {
            redis::cmd("WATCH")
                .arg(&key)
                .query_async::<_, ()>(&mut conn)
                .await
                .map_err(|e| CheckpointError::unavailable(e.to_string()))?;

            let raw: Option<String> = conn
                .get(&key)
                .await
                .map_err(|e: redis::RedisError| CheckpointError::unavailable(e.to_string()))?;
            let mut state = match Self::decode(id, raw) {
                Ok(state) => state,
                Err(e) => {
                    redis::cmd("UNWATCH")
                        .query_async::<_, ()>(&mut conn)
                        .await
                        .map_err(|e| CheckpointError::unavailable(e.to_string()))?;
                    return Err(e);
                }
            };
            apply_append(&mut state, turns.clone(), update.clone());
            let json = serde_json::to_string(&state)
                .map_err(|e| CheckpointError::serialization(e.to_string()))?;

            // EXEC answers nil when the watched key changed underneath us.
            let committed: Option<()> = redis::pipe()
                .atomic()
                .set(&key, json)
                .ignore()
                .query_async(&mut conn)
                .await
                .map_err(|e| CheckpointError::unavailable(e.to_string()))?;

            if committed.is_some() {
                return Ok(state);
            }
            tracing::debug!(conversation_id = %id, "checkpoint changed during append, retrying");
        }

        Err(CheckpointError::unavailable(format!(
            "conversation {} kept changing during append",
            id
        )))
    }
}

/// Opens a connection, treating a slow server like an unreachable one.
async fn within<T>(
    limit: Duration,
    connecting: impl Future<Output = redis::RedisResult<T>>,
) -> Result<T, CheckpointError> {
    match tokio::time::timeout(limit, connecting).await {
        Ok(result) => result.map_err(|e| CheckpointError::unavailable(e.to_string())),
        Err(_) => Err(CheckpointError::unavailable(format!(
            "redis connection timed out after {}s",
            limit.as_secs_f32()
        ))),
    }
}
