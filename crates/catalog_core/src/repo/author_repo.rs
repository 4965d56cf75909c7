//! Author repository contract and SQLite implementation.
//!
//! # Invariants
//! - `upsert_author` never overwrites an existing author's birth date.
//! - Deleting an author removes its `book_authors` links through the
//!   foreign-key cascade; books themselves are untouched.

use crate::model::author::Author;
use crate::model::EntityKind;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for authors.
pub trait AuthorRepository {
    fn find_author(&self, name: &str) -> RepoResult<Option<Author>>;
    fn exists_author(&self, name: &str) -> RepoResult<bool>;
    /// Inserts `author` unless its name is taken, then returns the stored row.
    fn upsert_author(&self, author: &Author) -> RepoResult<Author>;
    fn delete_author(&self, name: &str) -> RepoResult<()>;
}

/// SQLite-backed author repository.
pub struct SqliteAuthorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuthorRepository<'conn> {
    /// Constructs a repository after checking the connection schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["authors", "book_authors"])?;
        Ok(Self { conn })
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AuthorRepository for SqliteAuthorRepository<'_> {
    fn find_author(&self, name: &str) -> RepoResult<Option<Author>> {
        let author = self
            .conn
            .query_row(
                "SELECT name, birth_date FROM authors WHERE name = ?1;",
                [name],
                |row| Ok(Author::new(row.get::<_, String>(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(author)
    }

    fn exists_author(&self, name: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM authors WHERE name = ?1);",
            [name],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn upsert_author(&self, author: &Author) -> RepoResult<Author> {
        self.conn.execute(
            "INSERT INTO authors (name, birth_date)
             VALUES (?1, ?2)
             ON CONFLICT (name) DO NOTHING;",
            params![author.name.as_str(), author.birth_date],
        )?;

        self.find_author(&author.name)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "author `{}` missing after upsert",
                author.name
            ))
        })
    }

    fn delete_author(&self, name: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM authors WHERE name = ?1;", [name])?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Author, name));
        }
        Ok(())
    }
}
