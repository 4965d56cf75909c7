//! Catalog entity graph.
//!
//! # Responsibility
//! - Define `Book`, `Author` and `Publisher` as owned value types.
//! - Hold forward navigation (book -> authors, book -> publisher) in `Book`.
//!
//! # Invariants
//! - Every entity is keyed by a caller-supplied natural key (ISBN, author
//!   name, publisher name).
//! - Back-references (author -> books, publisher -> books) are not stored in
//!   memory; repositories resolve them on demand.

use std::fmt::{Display, Formatter};

pub mod author;
pub mod book;
pub mod publisher;

/// Names the entity a lookup key belongs to, for not-found reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Book,
    Author,
    Publisher,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Book => "book",
            Self::Author => "author",
            Self::Publisher => "publisher",
        };
        f.write_str(name)
    }
}
