use super::criteria::CriteriaBuilder;
use super::state::ConversationState;
use crate::screener::models::ScreenReport;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Per-user conversation record
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub state: ConversationState,
    pub criteria: CriteriaBuilder,
    pub candidates: Option<ScreenReport>,
    /// Set once the session has been removed from the store
    retired: bool,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            state: ConversationState::Init,
            criteria: CriteriaBuilder::new(),
            candidates: None,
            retired: false,
        }
    }

    /// Back to a blank accumulator waiting for the first answer
    pub fn restart(&mut self) {
        self.state = ConversationState::AwaitType;
        self.criteria = CriteriaBuilder::new();
        self.candidates = None;
    }

}

type SessionSlot = Arc<Mutex<Session>>;

/// Process-wide map from user id to session.
///
/// Each session sits behind its own async mutex, so turns for one user are
/// applied one at a time while different users never contend beyond the
/// brief map lookup.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionSlot>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, user_id: &str) -> SessionSlot {
        if let Some(slot) = self.sessions.read().await.get(user_id) {
            return Arc::clone(slot);
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Session::new(user_id)))),
        )
    }

    /// Exclusive access to the user's session, creating it on first contact.
    ///
    /// Waits for any turn already in progress for the same user.
    pub async fn acquire(&self, user_id: &str) -> SessionGuard {
        loop {
            let slot = self.slot(user_id).await;
            let guard = Arc::clone(&slot).lock_owned().await;

            // Removed while we were waiting; look the user up again
            if guard.retired {
                continue;
            }

            return SessionGuard {
                store: self.clone(),
                slot,
                guard,
            };
        }
    }

    /// Drop the user's session; the next turn starts from scratch
    pub async fn reset(&self, user_id: &str) -> bool {
        let slot = self.sessions.read().await.get(user_id).cloned();
        match slot {
            Some(slot) => {
                let guard = Arc::clone(&slot).lock_owned().await;
                SessionGuard {
                    store: self.clone(),
                    slot,
                    guard,
                }
                .remove()
                .await;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn clear(&self) {
        let slots: Vec<SessionSlot> = self.sessions.write().await.drain().map(|(_, s)| s).collect();
        for slot in slots {
            slot.lock().await.retired = true;
        }
    }

    pub async fn contains(&self, user_id: &str) -> bool {
        self.sessions.read().await.contains_key(user_id)
    }
}

/// Locked session; the user's next turn waits until this is dropped
pub struct SessionGuard {
    store: SessionStore,
    slot: SessionSlot,
    guard: OwnedMutexGuard<Session>,
}

impl SessionGuard {
    /// Remove this session from the store and release it
    pub async fn remove(mut self) {
        self.guard.retired = true;

        let mut sessions = self.store.sessions.write().await;
        let same = sessions
            .get(&self.guard.user_id)
            .is_some_and(|current| Arc::ptr_eq(current, &self.slot));
        if same {
            sessions.remove(&self.guard.user_id);
        }
    }
}

impl std::ops::Deref for SessionGuard {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.guard
    }
}

impl std::ops::DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Session {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_creates_once() {
        let store = SessionStore::new();
        {
            let mut s = store.acquire("+100").await;
            assert_eq!(s.state, ConversationState::Init);
            s.state = ConversationState::AwaitSide;
        }
        let s = store.acquire("+100").await;
        assert_eq!(s.state, ConversationState::AwaitSide);
        drop(s);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_then_acquire_is_fresh() {
        let store = SessionStore::new();
        let mut s = store.acquire("u").await;
        s.state = ConversationState::AwaitPremium;
        s.remove().await;

        assert!(!store.contains("u").await);
        let s = store.acquire("u").await;
        assert_eq!(s.state, ConversationState::Init);
    }

    #[tokio::test]
    async fn test_waiting_turn_sees_replacement_after_remove() {
        let store = SessionStore::new();
        let mut first = store.acquire("u").await;
        first.state = ConversationState::AwaitHorizon;

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                let s = store.acquire("u").await;
                s.state
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        first.remove().await;

        let state = waiter.await.unwrap();
        assert_eq!(state, ConversationState::Init);
    }

    #[tokio::test]
    async fn test_reset_and_clear() {
        let store = SessionStore::new();
        drop(store.acquire("a").await);
        drop(store.acquire("b").await);

        assert!(store.reset("a").await);
        assert!(!store.reset("a").await);
        assert_eq!(store.len().await, 1);

        store.clear().await;
        assert!(store.is_empty().await);
    }
}
