//! Book repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the book aggregate (row + author links).
//! - Resolve books through their author and publisher relationships.
//!
//! # Invariants
//! - `insert_book` expects every referenced author and the publisher to be
//!   stored already; foreign keys reject dangling references.
//! - Book lists are ordered by `isbn ASC`; author sets by `name ASC`.

use crate::model::author::Author;
use crate::model::book::Book;
use crate::model::publisher::Publisher;
use crate::model::EntityKind;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

const BOOK_SELECT_SQL: &str = "SELECT
    b.isbn AS isbn,
    b.title AS title,
    b.publisher_name AS publisher_name
FROM books b";

/// Repository interface for books.
pub trait BookRepository {
    fn exists_book(&self, isbn: &str) -> RepoResult<bool>;
    fn find_book(&self, isbn: &str) -> RepoResult<Option<Book>>;
    fn insert_book(&self, book: &Book) -> RepoResult<()>;
    /// Replaces the title only; relationships are untouched.
    fn update_title(&self, isbn: &str, title: &str) -> RepoResult<()>;
    fn delete_book(&self, isbn: &str) -> RepoResult<()>;
    fn find_books_by_author_name(&self, author_name: &str) -> RepoResult<Vec<Book>>;
    fn find_books_by_publisher_name(&self, publisher_name: &str) -> RepoResult<Vec<Book>>;
    /// Number of authors currently linked to the book.
    fn count_authors(&self, isbn: &str) -> RepoResult<u64>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Constructs a repository after checking the connection schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["books", "book_authors", "authors", "publishers"])?;
        Ok(Self { conn })
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn list_where(&self, filter_sql: &str, value: &str) -> RepoResult<Vec<Book>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOK_SELECT_SQL} {filter_sql} ORDER BY b.isbn ASC;"))?;
        let mut rows = stmt.query([value])?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            books.push(self.hydrate(row)?);
        }
        Ok(books)
    }

    fn hydrate(&self, row: &Row<'_>) -> RepoResult<Book> {
        let isbn: String = row.get("isbn")?;
        let authors = load_authors_for_book(self.conn, &isbn)?;
        Ok(Book {
            title: row.get("title")?,
            publisher: Publisher::new(row.get::<_, String>("publisher_name")?),
            authors,
            isbn,
        })
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn exists_book(&self, isbn: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = ?1);",
            [isbn],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn find_book(&self, isbn: &str) -> RepoResult<Option<Book>> {
        let row = self
            .conn
            .query_row(
                &format!("{BOOK_SELECT_SQL} WHERE b.isbn = ?1;"),
                [isbn],
                |row| {
                    Ok((
                        row.get::<_, String>("isbn")?,
                        row.get::<_, String>("title")?,
                        row.get::<_, String>("publisher_name")?,
                    ))
                },
            )
            .optional()?;

        let Some((isbn, title, publisher_name)) = row else {
            return Ok(None);
        };
        let authors = load_authors_for_book(self.conn, &isbn)?;
        Ok(Some(Book {
            isbn,
            title,
            authors,
            publisher: Publisher::new(publisher_name),
        }))
    }

    fn insert_book(&self, book: &Book) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO books (isbn, title, publisher_name) VALUES (?1, ?2, ?3);",
            params![
                book.isbn.as_str(),
                book.title.as_str(),
                book.publisher.publisher_name.as_str(),
            ],
        )?;

        for author in &book.authors {
            self.conn.execute(
                "INSERT OR IGNORE INTO book_authors (book_isbn, author_name) VALUES (?1, ?2);",
                params![book.isbn.as_str(), author.name.as_str()],
            )?;
        }
        Ok(())
    }

    fn update_title(&self, isbn: &str, title: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE books
             SET
                title = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE isbn = ?1;",
            params![isbn, title],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Book, isbn));
        }
        Ok(())
    }

    fn delete_book(&self, isbn: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM books WHERE isbn = ?1;", [isbn])?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Book, isbn));
        }
        Ok(())
    }

    fn find_books_by_author_name(&self, author_name: &str) -> RepoResult<Vec<Book>> {
        self.list_where(
            "WHERE EXISTS (
                SELECT 1
                FROM book_authors ba
                WHERE ba.book_isbn = b.isbn
                  AND ba.author_name = ?1
            )",
            author_name,
        )
    }

    fn find_books_by_publisher_name(&self, publisher_name: &str) -> RepoResult<Vec<Book>> {
        self.list_where("WHERE b.publisher_name = ?1", publisher_name)
    }

    fn count_authors(&self, isbn: &str) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM book_authors WHERE book_isbn = ?1;",
            [isbn],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative author count `{count}`")))
    }
}

fn load_authors_for_book(conn: &Connection, isbn: &str) -> RepoResult<BTreeSet<Author>> {
    let mut stmt = conn.prepare(
        "SELECT a.name, a.birth_date
         FROM book_authors ba
         INNER JOIN authors a ON a.name = ba.author_name
         WHERE ba.book_isbn = ?1
         ORDER BY a.name ASC;",
    )?;
    let mut rows = stmt.query([isbn])?;
    let mut authors = BTreeSet::new();
    while let Some(row) = rows.next()? {
        authors.insert(Author::new(row.get::<_, String>(0)?, row.get(1)?));
    }
    Ok(authors)
}
