//! File-based Checkpoint Store Adapter
//!
//! Stores each conversation as `<base>/<conversation_id>/state.yaml`. Writes
//! go to a temporary file that is renamed over the old one, so a crash never
//! leaves a truncated checkpoint behind.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::conversation::{ConversationState, Turn};
use crate::domain::foundation::ConversationId;
use crate::ports::{apply_append, CheckpointError, CheckpointStore, CheckpointUpdate};

#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    base_path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Arc<Mutex<()>>,
}

impl FileCheckpointStore {
    /// # Example
    /// ```ignore
    /// let store = FileCheckpointStore::new("./data/conversations");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn conversation_dir(&self, id: &ConversationId) -> PathBuf {
        self.base_path.join(id.as_str())
    }

    fn state_file_path(&self, id: &ConversationId) -> PathBuf {
        self.conversation_dir(id).join("state.yaml")
    }

    async fn read_state(&self, id: &ConversationId) -> Result<ConversationState, CheckpointError> {
        let file_path = self.state_file_path(id);

        let yaml = match fs::read_to_string(&file_path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CheckpointError::NotFound(id.clone()))
            }
            Err(e) => return Err(CheckpointError::unavailable(e.to_string())),
        };

        serde_yaml::from_str(&yaml).map_err(|e| CheckpointError::serialization(e.to_string()))
    }

    async fn write_state(&self, state: &ConversationState) -> Result<(), CheckpointError> {
        let dir = self.conversation_dir(&state.conversation_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CheckpointError::unavailable(e.to_string()))?;

        let yaml =
            serde_yaml::to_string(state).map_err(|e| CheckpointError::serialization(e.to_string()))?;

        let tmp_path = dir.join("state.yaml.tmp");
        fs::write(&tmp_path, yaml)
            .await
            .map_err(|e| CheckpointError::unavailable(e.to_string()))?;
        fs::rename(&tmp_path, self.state_file_path(&state.conversation_id))
            .await
            .map_err(|e| CheckpointError::unavailable(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, id: &ConversationId) -> Result<ConversationState, CheckpointError> {
        self.read_state(id).await
    }

    async fn save(&self, state: &ConversationState) -> Result<ConversationState, CheckpointError> {
        let _guard = self.write_lock.lock().await;
        let mut stored = state.clone();
        stored.version += 1;
        stored.touch();
        self.write_state(&stored).await?;
        Ok(stored)
    }

    async fn append_and_save(
        &self,
        id: &ConversationId,
        turns: Vec<Turn>,
        update: CheckpointUpdate,
    ) -> Result<ConversationState, CheckpointError> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.read_state(id).await?;
        apply_append(&mut state, turns, update);
        self.write_state(&state).await?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{AgentReply, RoutingHint, ToolRequest};
    use crate::domain::foundation::{AgentId, ToolCallId};
    use serde_json::json;
    use tempfile::TempDir;

    fn agent(name: &str) -> AgentId {
        AgentId::new(name).unwrap()
    }

    #[tokio::test]
    async fn state_round_trips_through_yaml_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(temp_dir.path());

        let mut state = ConversationState::new(
            ConversationId::parse("thread-1").unwrap(),
            agent("developer"),
            None,
        );
        state.turns.push(Turn::human("I want an e-commerce app"));
        state.turns.push(
            AgentReply::with_tools(
                agent("developer"),
                "",
                vec![ToolRequest::new(
                    ToolCallId::new("call_1"),
                    "search_knowledge_base",
                    json!({"query": "payments"}),
                )],
            )
            .into(),
        );
        state.routing_hint = RoutingHint::PendingTools;

        store.save(&state).await.unwrap();
        let loaded = store.load(&state.conversation_id).await.unwrap();

        assert_eq!(loaded.turns, state.turns);
        assert_eq!(loaded.routing_hint, RoutingHint::PendingTools);
        assert_eq!(loaded.version, 1);
        assert!(temp_dir.path().join("thread-1").join("state.yaml").exists());
        assert!(!temp_dir.path().join("thread-1").join("state.yaml.tmp").exists());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(temp_dir.path());
        let result = store.load(&ConversationId::generate()).await;
        assert!(matches!(result, Err(CheckpointError::NotFound(_))));
    }

    #[tokio::test]
    async fn append_and_save_persists_routing_update() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(temp_dir.path());
        let state = ConversationState::new(ConversationId::generate(), agent("a"), None);
        store.save(&state).await.unwrap();

        store
            .append_and_save(
                &state.conversation_id,
                vec![Turn::human("hello")],
                CheckpointUpdate {
                    active_agent: agent("b"),
                    routing_hint: RoutingHint::Handoff(agent("b")),
                },
            )
            .await
            .unwrap();

        let reopened = FileCheckpointStore::new(temp_dir.path());
        let loaded = reopened.load(&state.conversation_id).await.unwrap();
        assert_eq!(loaded.turns.len(), 1);
        assert_eq!(loaded.routing_hint, RoutingHint::Handoff(agent("b")));
        assert_eq!(loaded.version, 2);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(temp_dir.path());
        let id = ConversationId::parse("broken").unwrap();
        std::fs::create_dir_all(temp_dir.path().join("broken")).unwrap();
        std::fs::write(temp_dir.path().join("broken").join("state.yaml"), "turns: [").unwrap();

        let result = store.load(&id).await;
        assert!(matches!(result, Err(CheckpointError::Serialization(_))));
    }
}
