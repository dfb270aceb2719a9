//! Per-conversation serialization of inbound turns.
//!
//! Each conversation id maps to a `Semaphore(1)`; the permit is held for the
//! whole inbound turn. Different conversations never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::errors::EngineError;
use crate::config::LockPolicy;
use crate::domain::foundation::ConversationId;

pub struct ConversationLocks {
    policy: LockPolicy,
    locks: Mutex<HashMap<ConversationId, Arc<Semaphore>>>,
}

/// Exclusive right to run a turn; released on drop.
#[derive(Debug)]
pub struct ConversationGuard {
    _permit: OwnedSemaphorePermit,
}

impl ConversationLocks {
    pub fn new(policy: LockPolicy) -> Self {
        Self {
            policy,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<ConversationId, Arc<Semaphore>>> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Acquires the run lock for a conversation.
    ///
    /// # Errors
    /// `EngineError::Busy` when the policy is `Reject` and a turn is already
    /// in flight for `id`.
    pub async fn acquire(&self, id: &ConversationId) -> Result<ConversationGuard, EngineError> {
        let semaphore = self
            .map()
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Semaphore::new(1)))
            .clone();

        if let Ok(permit) = semaphore.clone().try_acquire_owned() {
            return Ok(ConversationGuard { _permit: permit });
        }

        match self.policy {
            LockPolicy::Reject => {
                tracing::info!(conversation_id = %id, "Rejecting message for busy conversation");
                Err(EngineError::Busy(id.clone()))
            }
            LockPolicy::Wait => {
                tracing::debug!(conversation_id = %id, "Waiting for in-flight turn to finish");
                semaphore
                    .acquire_owned()
                    .await
                    .map(|permit| ConversationGuard { _permit: permit })
                    .map_err(|_| EngineError::internal("conversation lock closed"))
            }
        }
    }

    /// Number of tracked conversations.
    pub fn tracked(&self) -> usize {
        self.map().len()
    }

    /// Drops entries nobody holds or waits on.
    pub fn prune_idle(&self) {
        // The map's own Arc is the only reference once every guard and
        // waiter is gone.
        self.map().retain(|_, semaphore| Arc::strong_count(semaphore) > 1);
    }
}

impl Default for ConversationLocks {
    fn default() -> Self {
        Self::new(LockPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn id(value: &str) -> ConversationId {
        ConversationId::parse(value).unwrap()
    }

    #[tokio::test]
    async fn sequential_access() {
        let locks = ConversationLocks::default();

        let first = locks.acquire(&id("t1")).await.unwrap();
        drop(first);

        let second = locks.acquire(&id("t1")).await.unwrap();
        drop(second);
    }

    #[tokio::test]
    async fn different_conversations_run_concurrently() {
        let locks = ConversationLocks::default();

        let _a = locks.acquire(&id("a")).await.unwrap();
        let _b = locks.acquire(&id("b")).await.unwrap();

        assert_eq!(locks.tracked(), 2);
    }

    #[tokio::test]
    async fn reject_policy_fails_fast_while_held() {
        let locks = ConversationLocks::new(LockPolicy::Reject);
        let _held = locks.acquire(&id("t1")).await.unwrap();

        let err = locks.acquire(&id("t1")).await.unwrap_err();

        assert_eq!(err.status(), "busy");
    }

    #[tokio::test]
    async fn wait_policy_queues_until_release() {
        let locks = Arc::new(ConversationLocks::new(LockPolicy::Wait));
        let held = locks.acquire(&id("t1")).await.unwrap();

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire(&id("t1")).await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn prune_keeps_held_locks() {
        let locks = ConversationLocks::default();
        let _held = locks.acquire(&id("busy")).await.unwrap();
        drop(locks.acquire(&id("idle")).await.unwrap());

        locks.prune_idle();

        assert_eq!(locks.tracked(), 1);
    }
}
