//! In-Memory Session Manager Implementation

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::{SessionError, SessionManagerPort};
use crate::domain::playback::PlayerSession;

/// 内存会话管理器
pub struct InMemorySessionManager {
    sessions: DashMap<String, PlayerSession>,
}

impl InMemorySessionManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemorySessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManagerPort for InMemorySessionManager {
    fn create(&self, session: PlayerSession) -> Result<String, SessionError> {
        let session_id = session.id().to_string();
        match self.sessions.entry(session_id.clone()) {
            Entry::Occupied(_) => Err(SessionError::AlreadyExists(session_id)),
            Entry::Vacant(slot) => {
                slot.insert(session);
                tracing::info!(session_id = %session_id, "Session created");
                Ok(session_id)
            }
        }
    }

    fn get(&self, id: &str) -> Result<PlayerSession, SessionError> {
        self.sessions
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn update(
        &self,
        id: &str,
        f: &mut dyn FnMut(&mut PlayerSession),
    ) -> Result<(), SessionError> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        f(&mut session);
        Ok(())
    }

    fn is_valid(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    fn close(&self, id: &str) -> Result<(), SessionError> {
        self.sessions
            .remove(id)
            .map(|_| {
                tracing::info!(session_id = %id, "Session closed");
            })
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn touch(&self, id: &str) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            session.touch();
        }
    }

    fn get_expired_sessions(&self, idle_timeout_secs: u64) -> Vec<String> {
        let cutoff = i64::try_from(idle_timeout_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|timeout| Utc::now().checked_sub_signed(timeout));
        let Some(cutoff) = cutoff else {
            return Vec::new();
        };

        self.sessions
            .iter()
            .filter(|entry| entry.last_activity() < cutoff)
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn list_all(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }
}
