//! Per-book, per-user reviews.
//!
//! Every mutation takes a [`Principal`], so the only review a caller can touch
//! is the one filed under the name the guard resolved for it.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::catalog::{CatalogRepository, ReviewRemoval, ReviewWrite, Reviews};
use crate::error::AppError;
use crate::identity::Principal;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReviewError {
    #[error("review text is required")]
    MissingReview,
    #[error("no book with isbn {0}")]
    BookNotFound(String),
    #[error("no review for isbn {0} by this user")]
    ReviewNotFound(String),
    #[error("catalog unavailable: {0}")]
    Catalog(AppError),
}

#[derive(Clone)]
pub struct ReviewLedger {
    catalog: Arc<dyn CatalogRepository>,
}

impl ReviewLedger {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self { Self { catalog } }

    pub fn upsert_review(&self, isbn: &str, principal: &Principal, review: Option<&str>) -> Result<ReviewWrite, ReviewError> {
        let review = review.filter(|r| !r.is_empty()).ok_or(ReviewError::MissingReview)?;
        let write = self
            .catalog
            .upsert_review(isbn, principal.username(), review)
            .map_err(ReviewError::Catalog)?
            .ok_or_else(|| ReviewError::BookNotFound(isbn.to_string()))?;
        info!(target: "reviews", isbn, user = principal.username(), created = write.created, "review stored");
        Ok(write)
    }

    /// Returns the reviews left on the book.
    pub fn delete_review(&self, isbn: &str, principal: &Principal) -> Result<Reviews, ReviewError> {
        match self.catalog.remove_review(isbn, principal.username()).map_err(ReviewError::Catalog)? {
            ReviewRemoval::NoSuchBook => Err(ReviewError::BookNotFound(isbn.to_string())),
            ReviewRemoval::NoSuchReview => Err(ReviewError::ReviewNotFound(isbn.to_string())),
            ReviewRemoval::Removed(left) => {
                info!(target: "reviews", isbn, user = principal.username(), "review deleted");
                Ok(left)
            }
        }
    }

    pub fn reviews(&self, isbn: &str) -> Result<Reviews, ReviewError> {
        self.catalog
            .book(isbn)
            .map_err(ReviewError::Catalog)?
            .map(|b| b.reviews)
            .ok_or_else(|| ReviewError::BookNotFound(isbn.to_string()))
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod ledger_tests;
