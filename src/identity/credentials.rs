use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::security::SecretProvider;

/// Stand-in PHC string with the default Argon2 parameters. Checking a login for
/// an unknown username against it costs the same as checking a real one, and
/// no password matches its all-zero output.
const UNKNOWN_USER_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2hlbGZtYXJrLWR1bW15IQ$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// A registered user. The secret is only ever held as a PHC hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub secret_hash: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CredentialError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("username already exists: {0}")]
    DuplicateUsername(String),
    #[error("credential storage failed: {0}")]
    Storage(AppError),
}

/// Backing storage for identities.
pub trait UserRepository: Send + Sync {
    fn contains(&self, username: &str) -> AppResult<bool>;
    fn find(&self, username: &str) -> AppResult<Option<Identity>>;
    /// Check and insert as one step. Returns false if the username was taken.
    fn insert_if_absent(&self, identity: Identity) -> AppResult<bool>;
    fn len(&self) -> AppResult<usize>;
}

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<String, Identity>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self { Self::default() }
}

impl UserRepository for MemoryUserRepository {
    fn contains(&self, username: &str) -> AppResult<bool> { Ok(self.users.read().contains_key(username)) }

    fn find(&self, username: &str) -> AppResult<Option<Identity>> { Ok(self.users.read().get(username).cloned()) }

    fn insert_if_absent(&self, identity: Identity) -> AppResult<bool> {
        let mut users = self.users.write();
        if users.contains_key(&identity.username) { return Ok(false); }
        users.insert(identity.username.clone(), identity);
        Ok(true)
    }

    fn len(&self) -> AppResult<usize> { Ok(self.users.read().len()) }
}

pub struct CredentialStore {
    repo: Arc<dyn UserRepository>,
    secrets: Arc<dyn SecretProvider>,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn UserRepository>, secrets: Arc<dyn SecretProvider>) -> Self { Self { repo, secrets } }

    pub fn is_username_available(&self, username: &str) -> AppResult<bool> {
        Ok(!self.repo.contains(username)?)
    }

    pub fn register(&self, username: Option<&str>, secret: Option<&str>) -> Result<(), CredentialError> {
        let username = username.filter(|s| !s.is_empty()).ok_or(CredentialError::MissingField("username"))?;
        let secret = secret.filter(|s| !s.is_empty()).ok_or(CredentialError::MissingField("password"))?;

        // Early out so a taken name does not pay for a hash. The insert below is
        // still the authoritative check.
        if !self.is_username_available(username).map_err(CredentialError::Storage)? {
            return Err(CredentialError::DuplicateUsername(username.to_string()));
        }
        let secret_hash = self.secrets.hash_secret(secret).map_err(|e| CredentialError::Storage(e.into()))?;
        let inserted = self
            .repo
            .insert_if_absent(Identity { username: username.to_string(), secret_hash })
            .map_err(CredentialError::Storage)?;
        if !inserted {
            debug!(target: "auth", username, "lost registration race");
            return Err(CredentialError::DuplicateUsername(username.to_string()));
        }
        info!(target: "auth", username, "user registered");
        Ok(())
    }

    /// True iff an identity with exactly this username and secret exists.
    pub fn verify(&self, username: &str, secret: &str) -> AppResult<bool> {
        match self.repo.find(username)? {
            Some(identity) => Ok(self.secrets.verify_secret(&identity.secret_hash, secret)),
            None => {
                self.secrets.verify_secret(UNKNOWN_USER_HASH, secret);
                Ok(false)
            }
        }
    }

    pub fn len(&self) -> AppResult<usize> { self.repo.len() }

    pub fn is_empty(&self) -> AppResult<bool> { Ok(self.len()? == 0) }
}
