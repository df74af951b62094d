//! Book catalog: read access for browsing and the narrow review-mutation
//! primitives the ledger builds on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

mod memory;

pub use memory::MemoryCatalog;

/// username -> review text
pub type Reviews = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub author: String,
    pub title: String,
    #[serde(default)]
    pub reviews: Reviews,
}

/// A book with its isbn attached, for listings that lose the map key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookEntry {
    pub isbn: String,
    #[serde(flatten)]
    pub book: Book,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewWrite {
    pub review: String,
    /// false when an earlier review by the same user was overwritten
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewRemoval {
    NoSuchBook,
    NoSuchReview,
    /// Reviews left on the book afterwards.
    Removed(Reviews),
}

/// Storage behind the catalog. Each method is atomic with respect to the others.
pub trait CatalogRepository: Send + Sync {
    fn books(&self) -> AppResult<BTreeMap<String, Book>>;
    fn book(&self, isbn: &str) -> AppResult<Option<Book>>;
    /// Insert or overwrite `reviews[isbn][username]`. `None` if the book is unknown.
    fn upsert_review(&self, isbn: &str, username: &str, review: &str) -> AppResult<Option<ReviewWrite>>;
    fn remove_review(&self, isbn: &str, username: &str) -> AppResult<ReviewRemoval>;
}

/// Case-insensitive exact match on author.
pub fn by_author(books: &BTreeMap<String, Book>, author: &str) -> Vec<BookEntry> {
    let needle = author.to_lowercase();
    matching(books, |b| b.author.to_lowercase() == needle)
}

/// Case-insensitive exact match on title.
pub fn by_title(books: &BTreeMap<String, Book>, title: &str) -> Vec<BookEntry> {
    let needle = title.to_lowercase();
    matching(books, |b| b.title.to_lowercase() == needle)
}

fn matching(books: &BTreeMap<String, Book>, pred: impl Fn(&Book) -> bool) -> Vec<BookEntry> {
    books
        .iter()
        .filter(|(_, b)| pred(b))
        .map(|(isbn, b)| BookEntry { isbn: isbn.clone(), book: b.clone() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_match_is_case_insensitive_and_exact() {
        let books = MemoryCatalog::seeded().books().unwrap();
        let hits = by_author(&books, "jane austen");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].isbn, "8");
        assert_eq!(hits[0].book.title, "Pride and Prejudice");
        assert!(by_author(&books, "Austen").is_empty());
        // several anonymous works share an author
        assert_eq!(by_author(&books, "UNKNOWN").len(), 4);
    }

    #[test]
    fn title_match_is_case_insensitive_and_exact() {
        let books = MemoryCatalog::seeded().books().unwrap();
        let hits = by_title(&books, "THINGS FALL APART");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].book.author, "Chinua Achebe");
        assert!(by_title(&books, "Things Fall").is_empty());
    }

    #[test]
    fn entries_serialize_flat_with_isbn() {
        let books = MemoryCatalog::seeded().books().unwrap();
        let hit = by_title(&books, "Molloy, Malone Dies, The Unnamable, the trilogy").remove(0);
        let v = serde_json::to_value(&hit).unwrap();
        assert_eq!(v["isbn"], "10");
        assert_eq!(v["author"], "Samuel Beckett");
        assert!(v["reviews"].as_object().unwrap().is_empty());
    }
}
