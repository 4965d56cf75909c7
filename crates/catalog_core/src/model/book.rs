//! Book aggregate.
//!
//! # Invariants
//! - `isbn` is globally unique and never reassigned.
//! - `publisher` is always present.
//! - `authors` may be empty after an author is removed; creation paths
//!   normally supply at least one author but this is not enforced.

use crate::model::author::Author;
use crate::model::publisher::Publisher;
use std::collections::BTreeSet;

/// ISBN used as the book key. Kept as an alias to make intent explicit in
/// signatures; no checksum validation is applied.
pub type Isbn = String;

/// A catalog book together with its resolved authors and publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub isbn: Isbn,
    pub title: String,
    pub authors: BTreeSet<Author>,
    pub publisher: Publisher,
}

impl Book {
    /// Creates a book with no authors attached yet.
    pub fn new(isbn: impl Into<Isbn>, title: impl Into<String>, publisher: Publisher) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            authors: BTreeSet::new(),
            publisher,
        }
    }

    /// Attaches one author, returning the book for chaining.
    pub fn with_author(mut self, author: Author) -> Self {
        self.authors.insert(author);
        self
    }

    /// Author names in ascending order.
    pub fn author_names(&self) -> Vec<&str> {
        self.authors.iter().map(|author| author.name.as_str()).collect()
    }
}
