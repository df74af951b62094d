use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use super::token::Token;
use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::tprintln;

pub type SessionId = String;

/// What a session is bound to after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBinding {
    pub token: Token,
    pub username: String,
}

#[derive(Debug)]
struct SessionEntry {
    binding: SessionBinding,
    expires_at: DateTime<Utc>,
}

/// 256-bit random id, base64url without padding.
pub fn new_session_id() -> AppResult<SessionId> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| AppError::internal("session_id", format!("no randomness for a session id: {e}")))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

/// Session id -> (token, username). Entries live for `ttl` from their last bind.
pub struct SessionRegistry {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { ttl, clock, sessions: RwLock::new(HashMap::new()) }
    }

    /// Overwrites whatever the session was bound to before.
    pub fn bind(&self, session_id: &str, token: Token, username: &str) -> AppResult<()> {
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::internal("session_ttl", format!("session lifetime {} is out of range", self.ttl)))?;
        let entry = SessionEntry { binding: SessionBinding { token, username: username.to_string() }, expires_at };
        self.sessions.write().insert(session_id.to_string(), entry);
        tprintln!("session.bind user={} ttl_secs={}", username, self.ttl.num_seconds());
        Ok(())
    }

    pub fn lookup(&self, session_id: &str) -> Option<SessionBinding> {
        let now = self.clock.now();
        let mut expired = false;
        let out = {
            let map = self.sessions.read();
            match map.get(session_id) {
                Some(ent) if ent.expires_at > now => Some(ent.binding.clone()),
                Some(_) => { expired = true; None }
                None => None,
            }
        };
        if expired {
            let mut map = self.sessions.write();
            // re-check under the write lock; a concurrent re-login may have rebound it
            if map.get(session_id).is_some_and(|e| e.expires_at <= now) {
                map.remove(session_id);
            }
        }
        out
    }

    /// True iff the id names a live session.
    pub fn contains(&self, session_id: &str) -> bool { self.lookup(session_id).is_some() }

    pub fn remove(&self, session_id: &str) -> bool { self.sessions.write().remove(session_id).is_some() }

    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut map = self.sessions.write();
        let before = map.len();
        map.retain(|_, e| e.expires_at > now);
        before - map.len()
    }

    pub fn len(&self) -> usize { self.sessions.read().len() }

    pub fn is_empty(&self) -> bool { self.sessions.read().is_empty() }
}
