use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use parking_lot::RwLock;

use super::{Book, CatalogRepository, ReviewRemoval, ReviewWrite, Reviews};
use crate::error::AppResult;

/// In-process catalog. One write lock covers every review mutation, so writes
/// to the same (isbn, username) serialize and the last to finish wins.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    books: RwLock<BTreeMap<String, Book>>,
}

const SEED: &[(&str, &str, &str)] = &[
    ("1", "Chinua Achebe", "Things Fall Apart"),
    ("2", "Hans Christian Andersen", "Fairy tales"),
    ("3", "Dante Alighieri", "The Divine Comedy"),
    ("4", "Unknown", "The Epic Of Gilgamesh"),
    ("5", "Unknown", "The Book Of Job"),
    ("6", "Unknown", "One Thousand and One Nights"),
    ("7", "Unknown", "Nj\u{e1}l's Saga"),
    ("8", "Jane Austen", "Pride and Prejudice"),
    ("9", "Honor\u{e9} de Balzac", "Le P\u{e8}re Goriot"),
    ("10", "Samuel Beckett", "Molloy, Malone Dies, The Unnamable, the trilogy"),
];

impl MemoryCatalog {
    pub fn new(books: BTreeMap<String, Book>) -> Self { Self { books: RwLock::new(books) } }

    /// The ten-book demo catalog, no reviews.
    pub fn seeded() -> Self {
        let books = SEED
            .iter()
            .map(|(isbn, author, title)| {
                (isbn.to_string(), Book { author: author.to_string(), title: title.to_string(), reviews: Reviews::new() })
            })
            .collect();
        Self::new(books)
    }

    /// Load `{isbn: {author, title, reviews?}}` from a JSON file.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading catalog {}", path.display()))?;
        let books: BTreeMap<String, Book> =
            serde_json::from_str(&raw).with_context(|| format!("parsing catalog {}", path.display()))?;
        Ok(Self::new(books))
    }

    pub fn insert(&self, isbn: &str, book: Book) { self.books.write().insert(isbn.to_string(), book); }
}

impl CatalogRepository for MemoryCatalog {
    fn books(&self) -> AppResult<BTreeMap<String, Book>> { Ok(self.books.read().clone()) }

    fn book(&self, isbn: &str) -> AppResult<Option<Book>> { Ok(self.books.read().get(isbn).cloned()) }

    fn upsert_review(&self, isbn: &str, username: &str, review: &str) -> AppResult<Option<ReviewWrite>> {
        let mut books = self.books.write();
        let Some(book) = books.get_mut(isbn) else { return Ok(None); };
        let previous = book.reviews.insert(username.to_string(), review.to_string());
        Ok(Some(ReviewWrite { review: review.to_string(), created: previous.is_none() }))
    }

    fn remove_review(&self, isbn: &str, username: &str) -> AppResult<ReviewRemoval> {
        let mut books = self.books.write();
        let Some(book) = books.get_mut(isbn) else { return Ok(ReviewRemoval::NoSuchBook); };
        if book.reviews.remove(username).is_none() {
            return Ok(ReviewRemoval::NoSuchReview);
        }
        Ok(ReviewRemoval::Removed(book.reviews.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn seeded_catalog_has_ten_books() {
        let c = MemoryCatalog::seeded();
        let books = c.books().unwrap();
        assert_eq!(books.len(), 10);
        assert_eq!(c.book("3").unwrap().unwrap().title, "The Divine Comedy");
        assert!(c.book("11").unwrap().is_none());
    }

    #[test]
    fn upsert_reports_created_then_overwritten() {
        let c = MemoryCatalog::seeded();
        let first = c.upsert_review("1", "alice", "great").unwrap().unwrap();
        assert!(first.created);
        let second = c.upsert_review("1", "alice", "even better").unwrap().unwrap();
        assert!(!second.created);
        let reviews = c.book("1").unwrap().unwrap().reviews;
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews["alice"], "even better");
        assert!(c.upsert_review("nope", "alice", "x").unwrap().is_none());
    }

    #[test]
    fn remove_distinguishes_missing_book_and_missing_review() {
        let c = MemoryCatalog::seeded();
        c.upsert_review("2", "alice", "a").unwrap();
        c.upsert_review("2", "bob", "b").unwrap();
        assert_eq!(c.remove_review("nope", "alice").unwrap(), ReviewRemoval::NoSuchBook);
        assert_eq!(c.remove_review("2", "carol").unwrap(), ReviewRemoval::NoSuchReview);
        let ReviewRemoval::Removed(left) = c.remove_review("2", "alice").unwrap() else { panic!("expected removal") };
        assert_eq!(left.len(), 1);
        assert_eq!(left["bob"], "b");
    }

    #[test]
    fn loads_catalog_from_json_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"123-456": {{"author": "A. Writer", "title": "A Book"}},
                 "789": {{"author": "B", "title": "C", "reviews": {{"zed": "meh"}}}}}}"#
        )
        .unwrap();
        let c = MemoryCatalog::from_json_file(f.path()).unwrap();
        assert_eq!(c.book("123-456").unwrap().unwrap().author, "A. Writer");
        assert!(c.book("123-456").unwrap().unwrap().reviews.is_empty());
        assert_eq!(c.book("789").unwrap().unwrap().reviews["zed"], "meh");
    }

    #[test]
    fn bad_catalog_file_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        let err = MemoryCatalog::from_json_file(f.path()).unwrap_err();
        assert!(err.to_string().contains("parsing catalog"));
        assert!(MemoryCatalog::from_json_file(Path::new("/definitely/not/here.json")).is_err());
    }
}
