//! Publisher repository contract and SQLite implementation.
//!
//! # Invariants
//! - A publisher referenced by any book cannot be deleted
//!   (`ON DELETE RESTRICT`); callers check `count_books` first.

use crate::model::publisher::Publisher;
use crate::model::EntityKind;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{Connection, OptionalExtension};

/// Repository interface for publishers.
pub trait PublisherRepository {
    fn find_publisher(&self, name: &str) -> RepoResult<Option<Publisher>>;
    fn exists_publisher(&self, name: &str) -> RepoResult<bool>;
    /// Inserts the publisher unless its name is taken, then returns it.
    fn upsert_publisher(&self, name: &str) -> RepoResult<Publisher>;
    fn delete_publisher(&self, name: &str) -> RepoResult<()>;
    /// Distinct publisher names over books written by `author_name`.
    fn find_publisher_names_by_author(&self, author_name: &str) -> RepoResult<Vec<String>>;
    /// Number of books currently referencing the publisher.
    fn count_books(&self, name: &str) -> RepoResult<u64>;
}

/// SQLite-backed publisher repository.
pub struct SqlitePublisherRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePublisherRepository<'conn> {
    /// Constructs a repository after checking the connection schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["publishers", "books", "book_authors"])?;
        Ok(Self { conn })
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PublisherRepository for SqlitePublisherRepository<'_> {
    fn find_publisher(&self, name: &str) -> RepoResult<Option<Publisher>> {
        let publisher = self
            .conn
            .query_row(
                "SELECT publisher_name FROM publishers WHERE publisher_name = ?1;",
                [name],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(Publisher::new);
        Ok(publisher)
    }

    fn exists_publisher(&self, name: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM publishers WHERE publisher_name = ?1);",
            [name],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn upsert_publisher(&self, name: &str) -> RepoResult<Publisher> {
        self.conn.execute(
            "INSERT INTO publishers (publisher_name)
             VALUES (?1)
             ON CONFLICT (publisher_name) DO NOTHING;",
            [name],
        )?;

        self.find_publisher(name)?.ok_or_else(|| {
            RepoError::InvalidData(format!("publisher `{name}` missing after upsert"))
        })
    }

    fn delete_publisher(&self, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM publishers WHERE publisher_name = ?1;",
            [name],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Publisher, name));
        }
        Ok(())
    }

    fn find_publisher_names_by_author(&self, author_name: &str) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT b.publisher_name
             FROM books b
             INNER JOIN book_authors ba ON ba.book_isbn = b.isbn
             WHERE ba.author_name = ?1
             ORDER BY b.publisher_name ASC;",
        )?;
        let mut rows = stmt.query([author_name])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get(0)?);
        }
        Ok(names)
    }

    fn count_books(&self, name: &str) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM books WHERE publisher_name = ?1;",
            [name],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative book count `{count}`")))
    }
}
