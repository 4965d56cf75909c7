//! Book catalog core: storage, entity model, transfer objects and the
//! catalog use-case service.

pub mod config;
pub mod db;
pub mod dto;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CatalogConfig, ConfigError, ConfigResult};
pub use dto::{AuthorDto, BookDto};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::author::Author;
pub use model::book::{Book, Isbn};
pub use model::publisher::Publisher;
pub use model::EntityKind;
pub use repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
pub use repo::book_repo::{BookRepository, SqliteBookRepository};
pub use repo::publisher_repo::{PublisherRepository, SqlitePublisherRepository};
pub use repo::{RepoError, RepoResult};
pub use service::catalog_service::{
    AuthorRemovalPolicy, CatalogError, CatalogResult, CatalogService,
};
