//! Cancellation tokens for in-flight turns.
//!
//! The driver registers a token when a turn starts and checks it between
//! internal iterations. Cancelling never interrupts a step halfway. The
//! registration is removed when its guard drops, including when the turn's
//! future is dropped mid-step.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::foundation::ConversationId;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

/// Registration of a running turn; unregisters on drop.
pub struct TurnRegistration<'a> {
    registry: &'a CancelRegistry,
    id: ConversationId,
    token: CancelToken,
}

impl TurnRegistration<'_> {
    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

impl Drop for TurnRegistration<'_> {
    fn drop(&mut self) {
        let mut tokens = self.registry.tokens();
        // A later registration for the same id owns the slot now.
        if tokens.get(&self.id).is_some_and(|t| t.same_as(&self.token)) {
            tokens.remove(&self.id);
        }
    }
}

#[derive(Default)]
pub struct CancelRegistry {
    tokens: Mutex<HashMap<ConversationId, CancelToken>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn tokens(&self) -> MutexGuard<'_, HashMap<ConversationId, CancelToken>> {
        self.tokens.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates a fresh token for a turn that is about to run.
    pub fn register(&self, id: &ConversationId) -> TurnRegistration<'_> {
        let token = CancelToken::new();
        self.tokens().insert(id.clone(), token.clone());
        TurnRegistration {
            registry: self,
            id: id.clone(),
            token,
        }
    }

    /// Signals the running turn, if any. Returns true when one was found.
    pub fn cancel(&self, id: &ConversationId) -> bool {
        match self.tokens().get(id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, id: &ConversationId) -> bool {
        self.tokens().contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_reaches_registered_token() {
        let registry = CancelRegistry::new();
        let id = ConversationId::generate();
        let registration = registry.register(&id);

        assert!(!registration.token().is_cancelled());
        assert!(registry.cancel(&id));
        assert!(registration.token().is_cancelled());
    }

    #[test]
    fn cancel_without_running_turn_reports_false() {
        let registry = CancelRegistry::new();
        assert!(!registry.cancel(&ConversationId::generate()));
    }

    #[test]
    fn dropping_the_registration_forgets_the_turn() {
        let registry = CancelRegistry::new();
        let id = ConversationId::generate();
        let registration = registry.register(&id);
        assert!(registry.is_running(&id));

        drop(registration);

        assert!(!registry.is_running(&id));
        assert!(!registry.cancel(&id));
    }

    #[test]
    fn new_registration_starts_uncancelled() {
        let registry = CancelRegistry::new();
        let id = ConversationId::generate();
        let old = registry.register(&id);
        registry.cancel(&id);

        let fresh = registry.register(&id);

        assert!(old.token().is_cancelled());
        assert!(!fresh.token().is_cancelled());
    }

    #[test]
    fn stale_registration_leaves_the_newer_one_in_place() {
        let registry = CancelRegistry::new();
        let id = ConversationId::generate();
        let old = registry.register(&id);
        let fresh = registry.register(&id);

        drop(old);

        assert!(registry.is_running(&id));
        assert!(registry.cancel(&id));
        assert!(fresh.token().is_cancelled());
    }
}
