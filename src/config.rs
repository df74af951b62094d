//! Server settings, read from `SHELFMARK_*` environment variables.
//!
//! | variable                      | default   |
//! |-------------------------------|-----------|
//! | `SHELFMARK_BIND_ADDR`         | `0.0.0.0` |
//! | `SHELFMARK_HTTP_PORT`         | `7000`    |
//! | `SHELFMARK_TOKEN_TTL_SECS`    | `3600` (at most ten years) |
//! | `SHELFMARK_SESSION_TTL_SECS`  | `3600` (at most ten years) |
//! | `SHELFMARK_SESSION_SWEEP_SECS`| `60` (0 disables the sweeper) |
//! | `SHELFMARK_CATALOG_TIMEOUT_MS`| `2000`    |
//! | `SHELFMARK_CATALOG_PATH`      | unset: built-in demo catalog |
//! | `SHELFMARK_SIGNING_SECRET`    | unset: random per process |
//! | `SHELFMARK_SECURE_COOKIE`     | `false`: set when served behind TLS |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

/// Longest accepted token or session lifetime: ten years.
pub const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

#[derive(Clone)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub http_port: u16,
    pub token_ttl: Duration,
    pub session_ttl: Duration,
    pub session_sweep_interval: Duration,
    pub catalog_timeout: Duration,
    pub catalog_path: Option<PathBuf>,
    pub signing_secret: Option<String>,
    pub secure_cookie: bool,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("http_port", &self.http_port)
            .field("token_ttl", &self.token_ttl)
            .field("session_ttl", &self.session_ttl)
            .field("session_sweep_interval", &self.session_sweep_interval)
            .field("catalog_timeout", &self.catalog_timeout)
            .field("catalog_path", &self.catalog_path)
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "<redacted>"))
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            http_port: 7000,
            token_ttl: Duration::from_secs(60 * 60),
            session_ttl: Duration::from_secs(60 * 60),
            session_sweep_interval: Duration::from_secs(60),
            catalog_timeout: Duration::from_millis(2000),
            catalog_path: None,
            signing_secret: None,
            secure_cookie: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> { Self::from_lookup(|k| std::env::var(k).ok()) }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(v) = lookup("SHELFMARK_BIND_ADDR") { cfg.bind_addr = parse("SHELFMARK_BIND_ADDR", &v)?; }
        if let Some(v) = lookup("SHELFMARK_HTTP_PORT") { cfg.http_port = parse("SHELFMARK_HTTP_PORT", &v)?; }
        if let Some(v) = lookup("SHELFMARK_TOKEN_TTL_SECS") { cfg.token_ttl = Duration::from_secs(parse("SHELFMARK_TOKEN_TTL_SECS", &v)?); }
        if let Some(v) = lookup("SHELFMARK_SESSION_TTL_SECS") { cfg.session_ttl = Duration::from_secs(parse("SHELFMARK_SESSION_TTL_SECS", &v)?); }
        if let Some(v) = lookup("SHELFMARK_SESSION_SWEEP_SECS") { cfg.session_sweep_interval = Duration::from_secs(parse("SHELFMARK_SESSION_SWEEP_SECS", &v)?); }
        if let Some(v) = lookup("SHELFMARK_CATALOG_TIMEOUT_MS") { cfg.catalog_timeout = Duration::from_millis(parse("SHELFMARK_CATALOG_TIMEOUT_MS", &v)?); }
        cfg.catalog_path = lookup("SHELFMARK_CATALOG_PATH").filter(|s| !s.is_empty()).map(PathBuf::from);
        cfg.signing_secret = lookup("SHELFMARK_SIGNING_SECRET").filter(|s| !s.is_empty());
        if let Some(v) = lookup("SHELFMARK_SECURE_COOKIE") { cfg.secure_cookie = parse("SHELFMARK_SECURE_COOKIE", &v)?; }

        check_ttl("SHELFMARK_TOKEN_TTL_SECS", cfg.token_ttl)?;
        check_ttl("SHELFMARK_SESSION_TTL_SECS", cfg.session_ttl)?;
        Ok(cfg)
    }

    pub fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.bind_addr, self.http_port) }
}

fn check_ttl(key: &str, ttl: Duration) -> Result<()> {
    if ttl.is_zero() { return Err(anyhow!("{key} must be positive")); }
    if ttl > MAX_TTL { return Err(anyhow!("{key} must be at most {} seconds", MAX_TTL.as_secs())); }
    Ok(())
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim().parse::<T>().with_context(|| format!("invalid value for {key}: {raw:?}"))
}
