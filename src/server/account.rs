use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{clear_session_cookie, parse_cookie, session_cookie, AppState, SESSION_COOKIE};
use crate::error::{AppError, AppResult};
use crate::identity::new_session_id;

#[derive(Debug, Deserialize)]
pub(super) struct CredentialsPayload {
    username: Option<String>,
    #[serde(alias = "secret")]
    password: Option<String>,
}

/// A body axum cannot read as credentials gets the same 400 as an empty one.
fn read_credentials(body: Result<Json<CredentialsPayload>, JsonRejection>) -> AppResult<CredentialsPayload> {
    body.map(|Json(payload)| payload).map_err(|rejection| {
        debug!(target: "auth", status = %rejection.status(), reason = %rejection.body_text(), "credentials body rejected");
        AppError::user("missing_field", "Username and password are required.")
    })
}

/// Argon2 is deliberately slow; keep it off the async workers.
async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| AppError::internal("join_error", e.to_string()))?
}

pub(super) async fn register(
    State(state): State<AppState>,
    body: Result<Json<CredentialsPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let payload = read_credentials(body)?;
    let credentials = state.credentials.clone();
    blocking(move || Ok(credentials.register(payload.username.as_deref(), payload.password.as_deref())?)).await?;
    Ok(Json(json!({"message": "User successfully registered. Now you can login."})))
}

pub(super) async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CredentialsPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let payload = read_credentials(body)?;
    let (Some(username), Some(password)) = (
        payload.username.filter(|s| !s.is_empty()),
        payload.password.filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::user("missing_field", "Username and password are required."));
    };

    let credentials = state.credentials.clone();
    let user = username.clone();
    let ok = blocking(move || credentials.verify(&user, &password)).await?;
    if !ok {
        warn!(target: "auth", username = %username, "login rejected");
        return Err(AppError::auth("invalid_credentials", "Invalid login credentials."));
    }

    let token = state.tokens.issue(&username)?;
    // Re-login on a live session rebinds it; anything else gets a fresh id so a
    // client cannot choose its own session id.
    let sid = match parse_cookie(&headers, SESSION_COOKIE).filter(|sid| state.sessions.contains(sid)) {
        Some(sid) => sid,
        None => new_session_id()?,
    };
    state.sessions.bind(&sid, token.clone(), &username)?;
    info!(target: "auth", username = %username, expires_at = %token.expires_at, "login succeeded");

    let mut out = HeaderMap::new();
    out.insert(header::SET_COOKIE, session_cookie(&sid, state.secure_cookie)?);
    Ok((out, Json(json!({"message": "Login successful", "accessToken": token.as_str()}))))
}

pub(super) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(sid) = parse_cookie(&headers, SESSION_COOKIE) {
        if state.sessions.remove(&sid) {
            info!(target: "auth", "session ended");
        }
    }
    let mut h = HeaderMap::new();
    h.insert(header::SET_COOKIE, clear_session_cookie());
    (h, Json(json!({"message": "Logged out"})))
}
