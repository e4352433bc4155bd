//! In-memory registry of live call sessions
//!
//! Each session sits behind its own async mutex. Webhooks for the same call
//! queue on that lock while different calls proceed independently.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use bluebuddy::{CallSession, DomainError};

pub type SessionHandle = Arc<Mutex<CallSession>>;

#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, SessionHandle>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, returning its shared handle
    pub fn insert(&self, session: CallSession) -> SessionHandle {
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.insert(id, handle.clone());
        handle
    }

    /// Clone the handle out so no map guard is held across an await
    pub fn get(&self, id: Uuid) -> Result<SessionHandle, DomainError> {
        self.sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DomainError::not_found("CallSession", id))
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn remove(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.remove(&id).map(|(_, handle)| handle)
    }

    pub fn handles(&self) -> Vec<(Uuid, SessionHandle)> {
        self.sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bluebuddy::PatientContext;

    fn session() -> CallSession {
        CallSession::new(
            PatientContext::new(1, "Jane", "Doe", "+15551234"),
            "system",
        )
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let store = SessionStore::new();
        let handle = store.insert(session());
        let id = handle.lock().await.id();

        let fetched = store.get(id).unwrap();
        assert!(Arc::ptr_eq(&handle, &fetched));
        assert_eq!(store.len(), 1);

        assert!(store.remove(id).is_some());
        assert!(!store.contains(id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_session_is_not_found() {
        let store = SessionStore::new();
        let err = store.get(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
