//! Signed, time-bounded identity tokens.
//!
//! Tokens are HS256 JWTs carrying `{"sub","iat","exp"}` (seconds since the
//! epoch), keyed by the provider's signing key. Expiry is judged against the
//! injected [`Clock`] rather than the wall clock, with no leeway. Tokens are
//! never stored server-side except inside sessions, and there is no
//! revocation: a token is good until `exp`.

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::security::SecretProvider;
use crate::tprintln;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature invalid")]
    BadSignature,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            // anything else is a token we did not sign as-is
            _ => TokenError::BadSignature,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// An issued token together with its decoded fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    encoded: String,
}

impl Token {
    /// The string handed to clients and kept in the session.
    pub fn as_str(&self) -> &str { &self.encoded }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.encoded) }
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secrets: Arc<dyn SecretProvider>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is checked against `clock` after the signature checks out
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding_key: EncodingKey::from_secret(secrets.signing_key()),
            decoding_key: DecodingKey::from_secret(secrets.signing_key()),
            validation,
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration { self.ttl }

    pub fn issue(&self, username: &str) -> AppResult<Token> { self.issue_with_ttl(username, self.ttl) }

    pub fn issue_with_ttl(&self, username: &str, ttl: Duration) -> AppResult<Token> {
        // JWT timestamps are whole seconds
        let issued_at = self.clock.now().trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::internal("token_ttl", format!("token lifetime {ttl} is out of range")))?;
        let claims = Claims { sub: username.to_string(), iat: issued_at.timestamp(), exp: expires_at.timestamp() };
        let encoded = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal("token_encoding", e.to_string()))?;
        tprintln!("token.issue sub={} exp={}", username, expires_at);
        Ok(Token { subject: claims.sub, issued_at, expires_at, encoded })
    }

    /// Check signature then expiry; returns the embedded username.
    pub fn verify(&self, encoded: &str) -> Result<String, TokenError> {
        self.decode(encoded).map(|t| t.subject)
    }

    pub fn decode(&self, encoded: &str) -> Result<Token, TokenError> {
        let claims = decode::<Claims>(encoded, &self.decoding_key, &self.validation)?.claims;
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(TokenError::BadSignature)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::BadSignature)?;

        if self.clock.now() >= expires_at {
            return Err(TokenError::Expired);
        }
        Ok(Token { subject: claims.sub, issued_at, expires_at, encoded: encoded.to_string() })
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod token_tests;
