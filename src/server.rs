//!
//! shelfmark HTTP server
//! ---------------------
//! This module defines the Axum-based HTTP API for the book catalog.
//!
//! Responsibilities:
//! - Public catalog browsing (full listing, by isbn, author, title).
//! - Registration, login and logout; login binds a signed token to a cookie session.
//! - Review add/modify/delete behind the session guard middleware.
//! - Background sweeping of expired sessions.
//!
//! Every route is also reachable under `/customer` (reviews under
//! `/customer/auth/review/{isbn}`) for clients of the older path layout.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderMap, HeaderValue};
use axum::routing::{get, post, put};
use axum::{middleware, Router};
use tracing::{info, warn};

use crate::catalog::{CatalogRepository, MemoryCatalog};
use crate::clock::{Clock, SystemClock};
use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::identity::{AuthorizationGuard, CredentialStore, MemoryUserRepository, SessionRegistry, TokenService, UserRepository};
use crate::ledger::ReviewLedger;
use crate::security::{Argon2SecretProvider, SecretProvider};

mod account;
mod books;
mod guard;
mod reviews;

pub use guard::require_session;

pub const SESSION_COOKIE: &str = "shelfmark_session";

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub tokens: Arc<TokenService>,
    pub sessions: Arc<SessionRegistry>,
    pub guard: AuthorizationGuard,
    pub catalog: Arc<dyn CatalogRepository>,
    pub ledger: ReviewLedger,
    pub catalog_timeout: std::time::Duration,
    pub secure_cookie: bool,
}

impl AppState {
    /// Wire the components together. Storage, secrets and time are injected so
    /// tests (and alternative backends) can swap them.
    pub fn new(
        config: &ServerConfig,
        catalog: Arc<dyn CatalogRepository>,
        users: Arc<dyn UserRepository>,
        secrets: Arc<dyn SecretProvider>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let token_ttl = chrono::Duration::from_std(config.token_ttl).context("token ttl out of range")?;
        let session_ttl = chrono::Duration::from_std(config.session_ttl).context("session ttl out of range")?;
        let tokens = Arc::new(TokenService::new(secrets.clone(), clock.clone(), token_ttl));
        let sessions = Arc::new(SessionRegistry::new(session_ttl, clock));
        Ok(Self {
            credentials: Arc::new(CredentialStore::new(users, secrets)),
            guard: AuthorizationGuard::new(sessions.clone(), tokens.clone()),
            tokens,
            sessions,
            ledger: ReviewLedger::new(catalog.clone()),
            catalog,
            catalog_timeout: config.catalog_timeout,
            secure_cookie: config.secure_cookie,
        })
    }

    /// Production wiring: in-memory repositories, wall clock, configured or random key.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let catalog: Arc<dyn CatalogRepository> = match &config.catalog_path {
            Some(path) => Arc::new(MemoryCatalog::from_json_file(path)?),
            None => Arc::new(MemoryCatalog::seeded()),
        };
        let secrets: Arc<dyn SecretProvider> = match &config.signing_secret {
            Some(key) => Arc::new(Argon2SecretProvider::new(key.as_bytes()).context("SHELFMARK_SIGNING_SECRET rejected")?),
            None => {
                warn!(target: "startup", "SHELFMARK_SIGNING_SECRET not set; using a random key, tokens will not survive a restart");
                Arc::new(Argon2SecretProvider::generate()?)
            }
        };
        Self::new(config, catalog, Arc::new(MemoryUserRepository::new()), secrets, Arc::new(SystemClock))
    }
}

/// All routes, with the guard layered over the review routes only.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/review/{isbn}", put(reviews::put_review).delete(reviews::delete_review))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let customer = Router::new()
        .route("/register", post(account::register))
        .route("/login", post(account::login))
        .route("/logout", post(account::logout))
        .nest("/auth", protected.clone());

    Router::new()
        .route("/", get(books::list_books))
        .route("/isbn/{isbn}", get(books::book_by_isbn))
        .route("/author/{author}", get(books::books_by_author))
        .route("/title/{title}", get(books::books_by_title))
        .route("/register", post(account::register))
        .route("/login", post(account::login))
        .route("/logout", post(account::logout))
        .merge(protected)
        .nest("/customer", customer)
        .with_state(state)
}

fn spawn_session_sweeper(sessions: Arc<SessionRegistry>, every: std::time::Duration) {
    if every.is_zero() {
        info!(target: "startup", "session sweeper disabled");
        return;
    }
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(every).await;
            let removed = sessions.sweep_expired();
            if removed > 0 { tracing::debug!(removed = removed, "session_sweep"); }
        }
    });
}

pub async fn run_with_config(config: ServerConfig) -> anyhow::Result<()> {
    info!(target: "startup", ?config, "shelfmark starting");
    let state = AppState::from_config(&config).context("while building application state")?;
    spawn_session_sweeper(state.sessions.clone(), config.session_sweep_interval);

    let app = router(state);
    let addr = config.socket_addr();
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Convenience entry point reading configuration from the environment.
pub async fn run() -> anyhow::Result<()> {
    run_with_config(ServerConfig::from_env()?).await
}

pub(crate) fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for cookie in headers.get_all(axum::http::header::COOKIE) {
        let Ok(s) = cookie.to_str() else { continue };
        for part in s.split(';') {
            let p = part.trim();
            if let Some((k, v)) = p.split_once('=') {
                if k == name { return Some(v.to_string()); }
            }
        }
    }
    None
}

pub(crate) fn session_cookie(sid: &str, secure: bool) -> AppResult<HeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!("{}={}; HttpOnly; SameSite=Strict; Path=/{}", SESSION_COOKIE, sid, secure))
        .map_err(|e| AppError::internal("cookie", e.to_string()))
}

pub(crate) fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("shelfmark_session=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Strict; Path=/")
}
