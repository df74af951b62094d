//! Secret handling: the token signing key and salted password hashes.
//!
//! Both live behind [`SecretProvider`] so the token service and the credential
//! store never see a hardcoded key or a plaintext password comparison.

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

/// Minimum accepted length for a configured signing key, in bytes.
pub const MIN_SIGNING_KEY_LEN: usize = 32;

pub trait SecretProvider: Send + Sync {
    /// Key used to sign and verify identity tokens.
    fn signing_key(&self) -> &[u8];
    /// One-way salted hash of a user secret, as a PHC string.
    fn hash_secret(&self, secret: &str) -> Result<String>;
    /// True iff `candidate` hashes to `stored`.
    fn verify_secret(&self, stored: &str, candidate: &str) -> bool;
}

pub struct Argon2SecretProvider {
    key: Vec<u8>,
}

impl std::fmt::Debug for Argon2SecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2SecretProvider").field("key", &"<redacted>").finish()
    }
}

impl Argon2SecretProvider {
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self> {
        let key = key.into();
        if key.len() < MIN_SIGNING_KEY_LEN {
            return Err(anyhow!("signing key must be at least {} bytes, got {}", MIN_SIGNING_KEY_LEN, key.len()));
        }
        Ok(Self { key })
    }

    /// Fresh random key. Tokens signed with it do not survive a restart.
    pub fn generate() -> Result<Self> {
        let mut key = vec![0u8; MIN_SIGNING_KEY_LEN];
        getrandom::getrandom(&mut key).map_err(|e| anyhow!(e.to_string()))?;
        Ok(Self { key })
    }
}

impl SecretProvider for Argon2SecretProvider {
    fn signing_key(&self) -> &[u8] { &self.key }

    fn hash_secret(&self, secret: &str) -> Result<String> { hash_password(secret) }

    fn verify_secret(&self, stored: &str, candidate: &str) -> bool { verify_password(stored, candidate) }
}

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}
