#![allow(dead_code)]

//! Session registry — owns every live interview cycle, keyed by session id.
//!
//! Each cycle sits behind its own async mutex: `start`, `submit_answer`, and
//! `end` for one session are serialized (context-log mutation spans two model
//! calls and must not interleave), while distinct sessions proceed fully in
//! parallel. The registry entry is removed when the session ends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::engine::InterviewCycle;

pub type SharedCycle = Arc<AsyncMutex<InterviewCycle>>;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<Uuid, SharedCycle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly started cycle under its session id.
    pub fn insert(&self, cycle: InterviewCycle) -> SharedCycle {
        let session_id = cycle.session_id();
        let shared = Arc::new(AsyncMutex::new(cycle));
        self.inner
            .lock()
            .expect("session registry poisoned")
            .insert(session_id, shared.clone());
        shared
    }

    /// Looks up a live session. Ended or unknown sessions are not found.
    pub fn get(&self, session_id: Uuid) -> Result<SharedCycle, AppError> {
        self.inner
            .lock()
            .expect("session registry poisoned")
            .get(&session_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No active session {session_id}")))
    }

    /// Drops a session from the registry once it has ended.
    pub fn remove(&self, session_id: Uuid) {
        self.inner
            .lock()
            .expect("session registry poisoned")
            .remove(&session_id);
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().expect("session registry poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::{Candidate, CandidateLevel};
    use std::collections::BTreeMap;

    fn make_cycle() -> InterviewCycle {
        let candidate = Candidate {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            years_experience: 1.0,
            skills: BTreeMap::new(),
            education: String::new(),
            level: CandidateLevel::Junior,
            past_scores: vec![],
        };
        InterviewCycle::new(candidate, "junior".to_string(), vec!["rust".to_string()]).unwrap()
    }

    #[test]
    fn test_insert_then_get() {
        let registry = SessionRegistry::new();
        let shared = registry.insert(make_cycle());
        let session_id = shared.try_lock().unwrap().session_id();
        assert!(registry.get(session_id).is_ok());
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn test_unknown_session_is_not_found() {
        let registry = SessionRegistry::new();
        let result = registry.get(Uuid::new_v4());
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_remove_makes_session_unreachable() {
        let registry = SessionRegistry::new();
        let shared = registry.insert(make_cycle());
        let session_id = shared.try_lock().unwrap().session_id();
        registry.remove(session_id);
        assert!(registry.get(session_id).is_err());
        assert_eq!(registry.active_count(), 0);
    }

    #[tokio::test]
    async fn test_sessions_lock_independently() {
        let registry = SessionRegistry::new();
        let first = registry.insert(make_cycle());
        let second = registry.insert(make_cycle());

        // Holding one session's lock must not block the other.
        let _held = first.lock().await;
        assert!(second.try_lock().is_ok());
        // The held session is busy for everyone else.
        assert!(first.try_lock().is_err());
    }
}
