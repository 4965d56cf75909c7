//! Command-line front end for the book catalog.
//!
//! # Responsibility
//! - Resolve configuration, open the catalog database and run one catalog
//!   operation per invocation.
//! - Print results as pretty JSON on stdout.
//!
//! # Invariants
//! - Exit status `2` means the looked-up book/author/publisher does not exist;
//!   `1` means any other failure.

use anyhow::{anyhow, Context, Result};
use catalog_core::db::open_db;
use catalog_core::{
    init_logging, AuthorDto, BookDto, CatalogConfig, CatalogError, CatalogService,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_FAILURE: u8 = 1;
const EXIT_NOT_FOUND: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "catalog", version, about = "Manage a book/author/publisher catalog")]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding configuration and `CATALOG_DB_PATH`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a book; authors and publisher are created when missing
    AddBook {
        #[arg(long)]
        isbn: String,
        #[arg(long)]
        title: String,
        /// Author as `NAME:YYYY-MM-DD`; repeat for co-authors
        #[arg(long = "author", value_parser = parse_author)]
        authors: Vec<AuthorDto>,
        #[arg(long)]
        publisher: String,
    },
    /// Show one book
    FindBook { isbn: String },
    /// Replace the title of one book
    UpdateBook {
        isbn: String,
        #[arg(long)]
        title: String,
    },
    /// Delete one book and print it
    RemoveBook { isbn: String },
    /// List books written by an author
    BooksByAuthor { name: String },
    /// List books issued by a publisher
    BooksByPublisher { name: String },
    /// List the authors of a book
    AuthorsByBook { isbn: String },
    /// List publishers that issued an author's books
    PublishersByAuthor { name: String },
    /// Delete an author and print it
    RemoveAuthor { name: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_status_for(&err))
        }
    }
}

/// `2` when the root failure is a catalog lookup miss, `1` otherwise.
fn exit_status_for(err: &anyhow::Error) -> u8 {
    let not_found = err
        .downcast_ref::<CatalogError>()
        .is_some_and(CatalogError::is_not_found);
    if not_found {
        EXIT_NOT_FOUND
    } else {
        EXIT_FAILURE
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    let mut conn = open_db(&config.database_path).with_context(|| {
        format!(
            "failed to open catalog database `{}`",
            config.database_path.display()
        )
    })?;
    let mut service =
        CatalogService::try_new(&mut conn)?.with_removal_policy(config.author_removal);
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    let output = match cli.command {
        Command::AddBook {
            isbn,
            title,
            authors,
            publisher,
        } => {
            let book = BookDto {
                isbn,
                title,
                authors: authors.into_iter().collect(),
                publisher,
            };
            let added = service.add_book(&book)?;
            serde_json::json!({ "added": added, "isbn": book.isbn })
        }
        Command::FindBook { isbn } => to_json(service.find_book_by_isbn(&isbn)?)?,
        Command::UpdateBook { isbn, title } => to_json(service.update_book(&isbn, &title)?)?,
        Command::RemoveBook { isbn } => to_json(service.remove_book(&isbn)?)?,
        Command::BooksByAuthor { name } => to_json(service.find_books_by_author(&name)?)?,
        Command::BooksByPublisher { name } => {
            to_json(service.find_books_by_publisher(&name)?)?
        }
        Command::AuthorsByBook { isbn } => to_json(service.find_authors_by_book(&isbn)?)?,
        Command::PublishersByAuthor { name } => {
            to_json(service.find_publishers_by_author(&name)?)?
        }
        Command::RemoveAuthor { name } => to_json(service.remove_author(&name)?)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<CatalogConfig> {
    let mut config = match &cli.config {
        Some(path) => CatalogConfig::load(path)
            .with_context(|| format!("failed to load config `{}`", path.display()))?,
        None => {
            let mut config = CatalogConfig::default();
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
    };
    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }
    config.validate()?;
    Ok(config)
}

fn to_json(value: impl serde::Serialize) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::AddBook { .. } => "add-book",
        Command::FindBook { .. } => "find-book",
        Command::UpdateBook { .. } => "update-book",
        Command::RemoveBook { .. } => "remove-book",
        Command::BooksByAuthor { .. } => "books-by-author",
        Command::BooksByPublisher { .. } => "books-by-publisher",
        Command::AuthorsByBook { .. } => "authors-by-book",
        Command::PublishersByAuthor { .. } => "publishers-by-author",
        Command::RemoveAuthor { .. } => "remove-author",
    }
}

/// Parses `NAME:YYYY-MM-DD`, splitting on the last colon so names may
/// contain colons.
fn parse_author(value: &str) -> Result<AuthorDto> {
    let (name, birth) = value
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("expected NAME:YYYY-MM-DD, got `{value}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("author name must not be empty in `{value}`"));
    }
    let birth_date = NaiveDate::parse_from_str(birth.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid birth date in `{value}`"))?;
    Ok(AuthorDto::new(name, birth_date))
}
