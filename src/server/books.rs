use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;
use tracing::error;

use super::AppState;
use crate::catalog::{self, Book, BookEntry, CatalogRepository};
use crate::error::{AppError, AppResult};

/// Run a catalog read on the blocking pool, bounded by the configured timeout.
/// Any failure to get an answer is an upstream error (500), never a 404.
async fn fetch<T, F>(state: &AppState, f: F) -> AppResult<T>
where
    F: FnOnce(&dyn CatalogRepository) -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    let catalog = state.catalog.clone();
    let job = tokio::task::spawn_blocking(move || f(catalog.as_ref()));
    match tokio::time::timeout(state.catalog_timeout, job).await {
        Ok(Ok(Ok(v))) => Ok(v),
        Ok(Ok(Err(e))) => {
            error!(target: "catalog", error = %e, "catalog read failed");
            Err(AppError::upstream("catalog_unavailable", e.message()))
        }
        Ok(Err(join)) => {
            error!(target: "catalog", error = %join, "catalog read panicked");
            Err(AppError::upstream("catalog_unavailable", "Catalog read failed"))
        }
        Err(_) => {
            error!(target: "catalog", timeout_ms = state.catalog_timeout.as_millis() as u64, "catalog read timed out");
            Err(AppError::upstream("catalog_timeout", "Catalog did not respond in time"))
        }
    }
}

pub(super) async fn list_books(State(state): State<AppState>) -> AppResult<Json<BTreeMap<String, Book>>> {
    fetch(&state, |c| c.books()).await.map(Json)
}

pub(super) async fn book_by_isbn(State(state): State<AppState>, Path(isbn): Path<String>) -> AppResult<Json<Book>> {
    let lookup = isbn.clone();
    fetch(&state, move |c| c.book(&lookup))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("book_not_found", format!("Book with ISBN {isbn} not found")))
}

pub(super) async fn books_by_author(State(state): State<AppState>, Path(author): Path<String>) -> AppResult<Json<Vec<BookEntry>>> {
    let books = fetch(&state, |c| c.books()).await?;
    let hits = catalog::by_author(&books, &author);
    if hits.is_empty() {
        return Err(AppError::not_found("no_match", "No books found by this author"));
    }
    Ok(Json(hits))
}

pub(super) async fn books_by_title(State(state): State<AppState>, Path(title): Path<String>) -> AppResult<Json<Vec<BookEntry>>> {
    let books = fetch(&state, |c| c.books()).await?;
    let hits = catalog::by_title(&books, &title);
    if hits.is_empty() {
        return Err(AppError::not_found("no_match", "No books found by this title"));
    }
    Ok(Json(hits))
}
