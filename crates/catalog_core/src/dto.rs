//! Transfer objects and explicit entity conversions.
//!
//! # Responsibility
//! - Define the `BookDto`/`AuthorDto` shapes exchanged with callers.
//! - Convert entities to transfer objects (and back) field by field.
//!
//! # Invariants
//! - `BookDto::publisher` always carries the publisher name.
//! - Wire names are camelCase (`birthDate`); dates are `YYYY-MM-DD`.

use crate::model::author::Author;
use crate::model::book::Book;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Author transfer object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorDto {
    pub name: String,
    pub birth_date: NaiveDate,
}

/// Book transfer object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub isbn: String,
    pub title: String,
    #[serde(default)]
    pub authors: BTreeSet<AuthorDto>,
    /// Publisher name.
    pub publisher: String,
}

impl AuthorDto {
    pub fn new(name: impl Into<String>, birth_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            birth_date,
        }
    }
}

impl BookDto {
    /// Author names in ascending order.
    pub fn author_names(&self) -> Vec<&str> {
        self.authors.iter().map(|author| author.name.as_str()).collect()
    }
}

impl From<&Author> for AuthorDto {
    fn from(value: &Author) -> Self {
        Self {
            name: value.name.clone(),
            birth_date: value.birth_date,
        }
    }
}

impl From<Author> for AuthorDto {
    fn from(value: Author) -> Self {
        Self {
            name: value.name,
            birth_date: value.birth_date,
        }
    }
}

impl From<&AuthorDto> for Author {
    fn from(value: &AuthorDto) -> Self {
        Author::new(value.name.clone(), value.birth_date)
    }
}

impl From<&Book> for BookDto {
    fn from(value: &Book) -> Self {
        Self {
            isbn: value.isbn.clone(),
            title: value.title.clone(),
            authors: value.authors.iter().map(AuthorDto::from).collect(),
            publisher: value.publisher.publisher_name.clone(),
        }
    }
}

impl From<Book> for BookDto {
    fn from(value: Book) -> Self {
        Self {
            isbn: value.isbn,
            title: value.title,
            authors: value.authors.into_iter().map(AuthorDto::from).collect(),
            publisher: value.publisher.publisher_name,
        }
    }
}
