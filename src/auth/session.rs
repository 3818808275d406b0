//! In-memory session and login-state store.
//!
//! Tokens are 32 random bytes, hex encoded. Both maps sit behind
//! `parking_lot::RwLock`; expired entries are pruned whenever a new one is
//! inserted.

use super::AuthError;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

/// How long a login state stays valid.
pub const STATE_TTL_MINUTES: i64 = 10;

/// A fresh random token.
pub fn random_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes).map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(hex::encode(bytes))
}

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: u64,
    expires: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    states: RwLock<HashMap<String, DateTime<Utc>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            states: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn issue_state(&self) -> Result<String, AuthError> {
        self.issue_state_at(Utc::now())
    }

    fn issue_state_at(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let state = random_token()?;
        let mut states = self.states.write();
        states.retain(|_, expires| *expires > now);
        states.insert(state.clone(), now + Duration::minutes(STATE_TTL_MINUTES));
        Ok(state)
    }

    /// Remove `state`; true if it was issued and hasn't expired.
    pub fn consume_state(&self, state: &str) -> bool {
        self.consume_state_at(state, Utc::now())
    }

    fn consume_state_at(&self, state: &str, now: DateTime<Utc>) -> bool {
        self.states
            .write()
            .remove(state)
            .is_some_and(|expires| expires > now)
    }

    pub fn create(&self, user_id: u64) -> Result<String, AuthError> {
        self.create_at(user_id, Utc::now())
    }

    fn create_at(&self, user_id: u64, now: DateTime<Utc>) -> Result<String, AuthError> {
        let token = random_token()?;
        let mut sessions = self.sessions.write();
        sessions.retain(|_, s| s.expires > now);
        sessions.insert(
            token.clone(),
            Session {
                user_id,
                expires: now + self.ttl,
            },
        );
        Ok(token)
    }

    /// The user a live session belongs to.
    pub fn user_id(&self, token: &str) -> Option<u64> {
        self.user_id_at(token, Utc::now())
    }

    fn user_id_at(&self, token: &str, now: DateTime<Utc>) -> Option<u64> {
        self.sessions
            .read()
            .get(token)
            .filter(|s| s.expires > now)
            .map(|s| s.user_id)
    }

    pub fn destroy(&self, token: &str) -> bool {
        self.sessions.write().remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
