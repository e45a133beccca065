use chrono::{DateTime, TimeDelta, Utc};
use rand_core::{OsRng, RngCore};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use super::types::{PublicUser, Session};

const TOKEN_BYTES: usize = 32;

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// In-memory bearer-token sessions
pub struct SessionStore {
    ttl: TimeDelta,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            // Out-of-range lifetimes are clamped to ten years
            ttl: TimeDelta::from_std(ttl).unwrap_or_else(|_| TimeDelta::days(3650)),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn issue(&self, user: PublicUser) -> Session {
        self.issue_at(user, Utc::now())
    }

    fn issue_at(&self, user: PublicUser, now: DateTime<Utc>) -> Session {
        let session = Session {
            token: new_token(),
            user,
            issued_at: now,
            expires_at: now + self.ttl,
        };
        debug!(username = %session.user.username, expires_at = %session.expires_at, "issued session");
        self.lock().insert(session.token.clone(), session.clone());
        session
    }

    /// Look up a live session; expired ones are removed
    pub fn resolve(&self, token: &str) -> Option<Session> {
        self.resolve_at(token, Utc::now())
    }

    fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let mut sessions = self.lock();
        match sessions.get(token) {
            Some(session) if session.is_expired_at(now) => {
                debug!(username = %session.user.username, "session expired");
                sessions.remove(token);
                None
            }
            Some(session) => Some(session.clone()),
            None => None,
        }
    }

    /// End a session. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    /// Drop every expired session
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
