use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use serde::Serialize;

pub const SESSION_COOKIE: &str = "gazette_session";

/// Fixed lifetime of a login.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// The authenticated account attached to admin requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

struct SessionEntry {
    user: SessionUser,
    expires_at: Instant,
}

/// Server-side sessions keyed by an opaque random token.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for `user` and return its token.
    pub fn create(&self, user: SessionUser) -> String {
        let token = B64.encode(rand::random::<[u8; 32]>());
        let now = Instant::now();

        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(
            token.clone(),
            SessionEntry {
                user,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Look up a live session. Expired entries are dropped on sight.
    pub fn get(&self, token: &str) -> Option<SessionUser> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get(token)?;
        if entry.expires_at > Instant::now() {
            return Some(entry.user.clone());
        }
        sessions.remove(token);
        None
    }

    pub fn destroy(&self, token: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> SessionUser {
        SessionUser {
            id: 1,
            username: "admin".into(),
        }
    }

    #[test]
    fn create_get_destroy() {
        let store = SessionStore::default();
        let token = store.create(admin());

        assert_eq!(store.get(&token), Some(admin()));
        assert!(store.destroy(&token));
        assert_eq!(store.get(&token), None);
        assert!(!store.destroy(&token));
    }

    #[test]
    fn tokens_are_unique() {
        let store = SessionStore::default();
        let a = store.create(admin());
        let b = store.create(admin());
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn expired_sessions_are_rejected_and_pruned() {
        let store = SessionStore::with_ttl(Duration::ZERO);
        let token = store.create(admin());
        assert_eq!(store.get(&token), None);
        assert!(store.is_empty());

        store.create(admin());
        store.create(admin());
        // each create prunes what expired before it
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        let store = SessionStore::default();
        assert_eq!(store.get("not-a-token"), None);
    }
}
