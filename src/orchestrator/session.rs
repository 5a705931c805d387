//! Session persistence: a keyed store of [`TripState`] records.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::orchestrator::state::TripState;

/// Storage seam for session state. The service reads a session before each
/// turn and writes it back after; implementations only need per-call
/// consistency, turn-level serialization is handled above this trait.
pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &str) -> Option<TripState>;

    fn put(&self, state: TripState);

    fn remove(&self, session_id: &str) -> Option<TripState>;
}

/// Process-local store backing tests and single-instance deployments.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, TripState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        match self.sessions.lock() {
            Ok(sessions) => sessions.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session_id: &str) -> Option<TripState> {
        match self.sessions.lock() {
            Ok(sessions) => sessions.get(session_id).cloned(),
            Err(poisoned) => poisoned.into_inner().get(session_id).cloned(),
        }
    }

    fn put(&self, state: TripState) {
        let entry = (state.session_id.clone(), state);
        match self.sessions.lock() {
            Ok(mut sessions) => {
                sessions.insert(entry.0, entry.1);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(entry.0, entry.1);
            }
        }
    }

    fn remove(&self, session_id: &str) -> Option<TripState> {
        match self.sessions.lock() {
            Ok(mut sessions) => sessions.remove(session_id),
            Err(poisoned) => poisoned.into_inner().remove(session_id),
        }
    }
}
