use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use super::{parse_cookie, AppState, SESSION_COOKIE};
use crate::error::AppError;

/// Rejects the request unless its session cookie is bound to a live token.
/// On success the resolved `Principal` is put in the request extensions,
/// which is the only place review handlers take the username from.
pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, AppError> {
    let sid = parse_cookie(request.headers(), SESSION_COOKIE);
    match state.guard.authorize(sid.as_deref()) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Err(e) => {
            warn!(target: "auth", method = %request.method(), path = %request.uri().path(), error = %e, "request rejected by guard");
            Err(e.into())
        }
    }
}
