//! Catalog use-case service.
//!
//! # Responsibility
//! - Orchestrate book/author/publisher repositories into the catalog use cases.
//! - Map entities to transfer objects at the service boundary.
//!
//! # Invariants
//! - Each public operation runs in exactly one SQLite transaction: writes use
//!   `IMMEDIATE` so existence checks and inserts are serialized, reads use a
//!   deferred transaction for a consistent snapshot.
//! - A failed operation leaves no partial writes behind.
//! - Adding a duplicate ISBN is `Ok(false)`, never an error.

use crate::dto::{AuthorDto, BookDto};
use crate::model::author::Author;
use crate::model::book::Book;
use crate::model::EntityKind;
use crate::repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
use crate::repo::book_repo::{BookRepository, SqliteBookRepository};
use crate::repo::publisher_repo::{PublisherRepository, SqlitePublisherRepository};
use crate::repo::{RepoError, RepoResult};
use log::{debug, info, warn};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// What happens to books and publishers when their author is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorRemovalPolicy {
    /// Delete the author and its book links only.
    #[default]
    Detach,
    /// Also delete books left without authors, then publishers left without
    /// books.
    Cascade,
}

impl AuthorRemovalPolicy {
    /// Stable lowercase name, matching the config value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detach => "detach",
            Self::Cascade => "cascade",
        }
    }
}

/// Service error for catalog use cases.
#[derive(Debug)]
pub enum CatalogError {
    /// Lookup by key found nothing.
    NotFound { kind: EntityKind, key: String },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl CatalogError {
    fn not_found(kind: EntityKind, key: &str) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    /// Returns whether this is a not-found failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, key } => write!(f, "{kind} not found: {key}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => err.source(),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, key } => Self::NotFound { kind, key },
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Repositories bound to one open transaction.
struct Repositories<'conn> {
    books: SqliteBookRepository<'conn>,
    authors: SqliteAuthorRepository<'conn>,
    publishers: SqlitePublisherRepository<'conn>,
}

impl<'conn> Repositories<'conn> {
    fn new(conn: &'conn Connection) -> Self {
        Self {
            books: SqliteBookRepository::new(conn),
            authors: SqliteAuthorRepository::new(conn),
            publishers: SqlitePublisherRepository::new(conn),
        }
    }
}

/// Catalog service facade over a migrated SQLite connection.
pub struct CatalogService<'conn> {
    conn: &'conn mut Connection,
    removal_policy: AuthorRemovalPolicy,
}

impl<'conn> CatalogService<'conn> {
    /// Creates a service after checking that `conn` carries the catalog schema.
    ///
    /// Uses `AuthorRemovalPolicy::Detach`.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        SqliteBookRepository::try_new(conn)?;
        Ok(Self {
            conn,
            removal_policy: AuthorRemovalPolicy::default(),
        })
    }

    /// Replaces the author removal policy.
    pub fn with_removal_policy(mut self, policy: AuthorRemovalPolicy) -> Self {
        self.removal_policy = policy;
        self
    }

    pub fn removal_policy(&self) -> AuthorRemovalPolicy {
        self.removal_policy
    }

    /// Adds a book, reusing or creating its authors and publisher by name.
    ///
    /// # Contract
    /// - Returns `Ok(false)` without writing when the ISBN already exists.
    /// - Existing authors keep their stored birth date.
    /// - Returns `Ok(true)` once book, authors, publisher and links are stored.
    pub fn add_book(&mut self, book: &BookDto) -> CatalogResult<bool> {
        let started_at = Instant::now();
        let added = self.write(|repos| {
            if repos.books.exists_book(&book.isbn)? {
                return Ok(false);
            }

            let mut authors = BTreeSet::new();
            for author in &book.authors {
                authors.insert(repos.authors.upsert_author(&Author::from(author))?);
            }
            let publisher = repos.publishers.upsert_publisher(&book.publisher)?;

            let entity = Book {
                isbn: book.isbn.clone(),
                title: book.title.clone(),
                authors,
                publisher,
            };
            repos.books.insert_book(&entity)?;
            Ok(true)
        })?;

        if added {
            info!(
                "event=book_add module=service status=ok isbn={} author_count={} duration_ms={}",
                book.isbn,
                book.authors.len(),
                started_at.elapsed().as_millis()
            );
        } else {
            info!(
                "event=book_add module=service status=duplicate isbn={}",
                book.isbn
            );
        }
        Ok(added)
    }

    /// Gets one book by ISBN.
    pub fn find_book_by_isbn(&mut self, isbn: &str) -> CatalogResult<BookDto> {
        self.read(|repos| require_book(repos, isbn).map(BookDto::from))
    }

    /// Deletes one book and returns its state captured before deletion.
    ///
    /// Authors and the publisher are kept.
    pub fn remove_book(&mut self, isbn: &str) -> CatalogResult<BookDto> {
        let removed = self.write(|repos| {
            let book = require_book(repos, isbn)?;
            repos.books.delete_book(isbn)?;
            Ok(BookDto::from(book))
        })?;
        info!("event=book_remove module=service status=ok isbn={isbn}");
        Ok(removed)
    }

    /// Replaces the title of one book and returns the updated book.
    pub fn update_book(&mut self, isbn: &str, title: &str) -> CatalogResult<BookDto> {
        let updated = self.write(|repos| {
            repos.books.update_title(isbn, title)?;
            require_book(repos, isbn).map(BookDto::from)
        })?;
        info!("event=book_update module=service status=ok isbn={isbn}");
        Ok(updated)
    }

    /// Lists books written by the named author, ordered by ISBN.
    pub fn find_books_by_author(&mut self, author_name: &str) -> CatalogResult<Vec<BookDto>> {
        self.read(|repos| {
            if !repos.authors.exists_author(author_name)? {
                return Err(CatalogError::not_found(EntityKind::Author, author_name));
            }
            let books = repos.books.find_books_by_author_name(author_name)?;
            Ok(books.into_iter().map(BookDto::from).collect())
        })
    }

    /// Lists books issued by the named publisher, ordered by ISBN.
    pub fn find_books_by_publisher(
        &mut self,
        publisher_name: &str,
    ) -> CatalogResult<Vec<BookDto>> {
        self.read(|repos| {
            if !repos.publishers.exists_publisher(publisher_name)? {
                return Err(CatalogError::not_found(
                    EntityKind::Publisher,
                    publisher_name,
                ));
            }
            let books = repos.books.find_books_by_publisher_name(publisher_name)?;
            Ok(books.into_iter().map(BookDto::from).collect())
        })
    }

    /// Lists the authors of one book, ordered by name.
    pub fn find_authors_by_book(&mut self, isbn: &str) -> CatalogResult<Vec<AuthorDto>> {
        self.read(|repos| {
            let book = require_book(repos, isbn)?;
            Ok(book.authors.into_iter().map(AuthorDto::from).collect())
        })
    }

    /// Lists distinct publisher names over the author's books.
    ///
    /// An unknown author yields an empty list.
    pub fn find_publishers_by_author(&mut self, author_name: &str) -> CatalogResult<Vec<String>> {
        self.read(|repos| {
            Ok(repos
                .publishers
                .find_publisher_names_by_author(author_name)?)
        })
    }

    /// Removes one author and applies the configured removal policy.
    ///
    /// Returns the author as stored before removal.
    pub fn remove_author(&mut self, name: &str) -> CatalogResult<AuthorDto> {
        let policy = self.removal_policy;
        let (author, cleanup) = self.write(|repos| {
            let author = repos
                .authors
                .find_author(name)?
                .ok_or_else(|| CatalogError::not_found(EntityKind::Author, name))?;

            let authored = match policy {
                AuthorRemovalPolicy::Detach => Vec::new(),
                AuthorRemovalPolicy::Cascade => repos.books.find_books_by_author_name(name)?,
            };
            repos.authors.delete_author(name)?;

            let cleanup = match policy {
                AuthorRemovalPolicy::Detach => CascadeCleanup::default(),
                AuthorRemovalPolicy::Cascade => cascade_after_author_removal(repos, authored)?,
            };
            Ok((AuthorDto::from(author), cleanup))
        })?;

        info!(
            "event=author_remove module=service status=ok policy={} books_removed={} publishers_removed={}",
            policy.as_str(),
            cleanup.books_removed,
            cleanup.publishers_removed
        );
        Ok(author)
    }

    fn read<T>(
        &mut self,
        op: impl FnOnce(&Repositories<'_>) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        self.run(TransactionBehavior::Deferred, op)
    }

    fn write<T>(
        &mut self,
        op: impl FnOnce(&Repositories<'_>) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        self.run(TransactionBehavior::Immediate, op)
    }

    fn run<T>(
        &mut self,
        behavior: TransactionBehavior,
        op: impl FnOnce(&Repositories<'_>) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        let tx = self.conn.transaction_with_behavior(behavior)?;
        let outcome = op(&Repositories::new(&tx));
        match outcome {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if err.is_not_found() {
                    debug!("event=catalog_tx module=service status=rollback reason=not_found error={err}");
                } else {
                    warn!("event=catalog_tx module=service status=rollback error={err}");
                }
                Err(err)
            }
        }
    }
}

#[derive(Debug, Default)]
struct CascadeCleanup {
    books_removed: usize,
    publishers_removed: usize,
}

fn require_book(repos: &Repositories<'_>, isbn: &str) -> CatalogResult<Book> {
    repos
        .books
        .find_book(isbn)?
        .ok_or_else(|| CatalogError::not_found(EntityKind::Book, isbn))
}

/// Deletes books from `authored` that lost their last author, then the
/// publishers of those books that no longer have any book.
fn cascade_after_author_removal(
    repos: &Repositories<'_>,
    authored: Vec<Book>,
) -> CatalogResult<CascadeCleanup> {
    let mut cleanup = CascadeCleanup::default();
    let mut touched_publishers = BTreeSet::new();

    for book in authored {
        if repos.books.count_authors(&book.isbn)? > 0 {
            continue;
        }
        repos.books.delete_book(&book.isbn)?;
        cleanup.books_removed += 1;
        touched_publishers.insert(book.publisher.publisher_name);
    }

    for publisher_name in touched_publishers {
        if repos.publishers.count_books(&publisher_name)? == 0 {
            repos.publishers.delete_publisher(&publisher_name)?;
            cleanup.publishers_removed += 1;
        }
    }
    Ok(cleanup)
}
