use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::error::AppResult;
use crate::identity::Principal;

#[derive(Debug, Deserialize)]
pub(super) struct ReviewParams {
    review: Option<String>,
}

pub(super) async fn put_review(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(isbn): Path<String>,
    Query(params): Query<ReviewParams>,
) -> AppResult<Json<Value>> {
    let write = state.ledger.upsert_review(&isbn, &principal, params.review.as_deref())?;
    let verb = if write.created { "added" } else { "modified" };
    Ok(Json(json!({
        "message": format!("Review for ISBN {isbn} has been {verb}."),
        "review": write.review,
    })))
}

pub(super) async fn delete_review(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(isbn): Path<String>,
) -> AppResult<Json<Value>> {
    let left = state.ledger.delete_review(&isbn, &principal)?;
    Ok(Json(json!({
        "message": format!("Review for ISBN {isbn} by {} has been deleted.", principal.username()),
        "reviews": left,
    })))
}
