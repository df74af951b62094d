//! Shared helpers for HTTP integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use shelfmark::catalog::{Book, CatalogRepository, MemoryCatalog, Reviews};
use shelfmark::clock::ManualClock;
use shelfmark::config::ServerConfig;
use shelfmark::identity::MemoryUserRepository;
use shelfmark::security::Argon2SecretProvider;
use shelfmark::server::{router, AppState};

pub struct TestApp {
    pub base: String,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
}

/// The demo catalog plus the isbn used in the documented walkthrough.
pub fn test_catalog() -> MemoryCatalog {
    let c = MemoryCatalog::seeded();
    c.insert("123-456", Book { author: "A. Writer".into(), title: "A Book".into(), reviews: Reviews::new() });
    c
}

pub async fn spawn_app() -> TestApp { spawn_app_with(ServerConfig::default(), Arc::new(test_catalog())).await }

pub async fn spawn_app_with(config: ServerConfig, catalog: Arc<dyn CatalogRepository>) -> TestApp {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let secrets = Arc::new(Argon2SecretProvider::generate().expect("signing key"));
    let state = AppState::new(&config, catalog, Arc::new(MemoryUserRepository::new()), secrets, clock.clone())
        .expect("app state");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    TestApp { base: format!("http://{addr}"), state, clock }
}

/// A client with its own cookie jar, i.e. its own session.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(10))
        .build()
        .expect("client")
}

pub async fn register(c: &reqwest::Client, base: &str, user: &str, pw: &str) -> reqwest::Response {
    c.post(format!("{base}/register"))
        .json(&serde_json::json!({"username": user, "password": pw}))
        .send()
        .await
        .expect("register request")
}

pub async fn login(c: &reqwest::Client, base: &str, user: &str, pw: &str) -> reqwest::Response {
    c.post(format!("{base}/login"))
        .json(&serde_json::json!({"username": user, "password": pw}))
        .send()
        .await
        .expect("login request")
}

pub async fn put_review(c: &reqwest::Client, base: &str, isbn: &str, review: &str) -> reqwest::Response {
    c.put(format!("{base}/review/{isbn}"))
        .query(&[("review", review)])
        .send()
        .await
        .expect("put request")
}

pub async fn delete_review(c: &reqwest::Client, base: &str, isbn: &str) -> reqwest::Response {
    c.delete(format!("{base}/review/{isbn}")).send().await.expect("delete request")
}

pub async fn json(resp: reqwest::Response) -> Value { resp.json::<Value>().await.expect("json body") }

pub async fn signed_in(base: &str, user: &str, pw: &str) -> reqwest::Client {
    let c = client();
    assert_eq!(register(&c, base, user, pw).await.status(), 200);
    assert_eq!(login(&c, base, user, pw).await.status(), 200);
    c
}
