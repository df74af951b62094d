use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::principal::Principal;
use super::session::SessionRegistry;
use super::token::{TokenError, TokenService};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GuardError {
    #[error("no session bound")]
    SessionMissing,
    #[error("session token rejected: {0}")]
    TokenInvalid(TokenError),
}

/// Admits a request only when its session is bound to a token that still verifies.
#[derive(Clone)]
pub struct AuthorizationGuard {
    sessions: Arc<SessionRegistry>,
    tokens: Arc<TokenService>,
}

impl AuthorizationGuard {
    pub fn new(sessions: Arc<SessionRegistry>, tokens: Arc<TokenService>) -> Self { Self { sessions, tokens } }

    pub fn authorize(&self, session_id: Option<&str>) -> Result<Principal, GuardError> {
        let binding = session_id
            .and_then(|sid| self.sessions.lookup(sid))
            .ok_or(GuardError::SessionMissing)?;
        let subject = self.tokens.verify(binding.token.as_str()).map_err(GuardError::TokenInvalid)?;
        if subject != binding.username {
            debug!(target: "auth", bound = %binding.username, subject = %subject, "token subject does not match session");
            return Err(GuardError::TokenInvalid(TokenError::BadSignature));
        }
        Ok(Principal::new(subject))
    }
}
