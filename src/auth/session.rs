//! Server-side pending sessions for the second-factor flow.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A login that passed credential verification and is waiting for its
/// one-time code. Keyed by an unguessable token; completed sessions are
/// never held here.
#[derive(Clone, Debug)]
pub struct PendingSession {
    pub token: String,
    pub username: String,
    pub challenge_code: String,
    pub challenge_issued_at: DateTime<Utc>,
}

/// Store for pending second-factor sessions.
///
/// `take` removes the entry it returns: a challenge accepts exactly one
/// verification submission, and racing callers must not both see it.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: PendingSession);

    /// Remove and return the session for `token`, if present.
    ///
    /// Aged-out entries are still returned so the caller can tell an expired
    /// challenge apart from an unknown token.
    fn take(&self, token: &str) -> Option<PendingSession>;
}

/// In-memory session store; aged-out entries are purged on insert.
#[derive(Debug)]
pub struct MemorySessionStore {
    ttl: chrono::Duration,
    sessions: Mutex<HashMap<String, PendingSession>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn insert(&self, session: PendingSession) {
        let now = Utc::now();
        let mut sessions = self.lock();
        sessions.retain(|_, entry| now.signed_duration_since(entry.challenge_issued_at) < self.ttl);
        sessions.insert(session.token.clone(), session);
    }

    fn take(&self, token: &str) -> Option<PendingSession> {
        self.lock().remove(token)
    }
}
