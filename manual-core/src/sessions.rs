use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::{util::random_string, PrimaryKey};

/// Login session data for authentication
#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    /// The session token, or key if you will
    pub token: String,
    /// The user that is logged in
    pub user_id: PrimaryKey,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Keeps sessions in memory, so all of them are gone after a restart.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionData>,
}

impl SessionStore {
    pub const SESSION_DURATION_IN_HOURS: i64 = 24;
    const TOKEN_LENGTH: usize = 32;

    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session for the user that expires after 24 hours
    pub fn create(&self, user_id: PrimaryKey) -> SessionData {
        self.create_at(user_id, Utc::now())
    }

    /// Returns the session if it exists and hasn't expired
    pub fn get(&self, token: &str) -> Option<SessionData> {
        self.get_at(token, Utc::now())
    }

    /// Deletes the session, if it exists
    pub fn delete(&self, token: &str) {
        self.sessions.remove(token);
    }

    /// Removes every session that has expired
    pub fn clear_expired(&self) {
        let now = Utc::now();
        self.sessions.retain(|_, s| !s.is_expired_at(now));
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn create_at(&self, user_id: PrimaryKey, now: DateTime<Utc>) -> SessionData {
        let session = SessionData {
            token: random_string(Self::TOKEN_LENGTH),
            user_id,
            expires_at: now + Duration::hours(Self::SESSION_DURATION_IN_HOURS),
        };

        self.sessions.insert(session.token.clone(), session.clone());
        session
    }

    fn get_at(&self, token: &str, now: DateTime<Utc>) -> Option<SessionData> {
        self.sessions
            .get(token)
            .map(|s| s.value().clone())
            .filter(|s| !s.is_expired_at(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_session_can_be_looked_up() {
        let store = SessionStore::new();
        let session = store.create(7);

        assert_eq!(session.token.len(), 32);
        assert_eq!(store.get(&session.token), Some(session));
        assert_eq!(store.get("unknown"), None);
    }

    #[test]
    fn session_expires_after_a_day() {
        let store = SessionStore::new();
        let created = Utc::now();
        let session = store.create_at(1, created);

        assert_eq!(session.expires_at, created + Duration::hours(24));
        assert!(store
            .get_at(&session.token, created + Duration::hours(23))
            .is_some());
        assert!(store
            .get_at(&session.token, created + Duration::hours(25))
            .is_none());

        // Expired sessions are only hidden, not purged
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear_expired_purges_old_sessions() {
        let store = SessionStore::new();
        store.create_at(1, Utc::now() - Duration::hours(48));
        let fresh = store.create(2);

        store.clear_expired();

        assert_eq!(store.len(), 1);
        assert!(store.get(&fresh.token).is_some());
    }

    #[test]
    fn deleted_session_is_gone() {
        let store = SessionStore::new();
        let session = store.create(3);

        store.delete(&session.token);
        store.delete("never-existed");

        assert!(store.get(&session.token).is_none());
        assert!(store.is_empty());
    }
}
