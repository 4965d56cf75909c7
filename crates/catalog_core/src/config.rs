//! Catalog runtime configuration.
//!
//! # Responsibility
//! - Describe where the catalog database lives, how to log, and which
//!   author removal policy applies.
//! - Load that description from a TOML file with environment overrides.
//!
//! # Invariants
//! - Every field has a default; an empty file yields `CatalogConfig::default()`.
//! - Unknown keys and unsupported values are rejected, never ignored.
//!
//! Example:
//!
//! ```toml
//! database_path = "/var/lib/catalog/catalog.sqlite3"
//! log_level = "info"
//! log_dir = "/var/log/catalog"
//! author_removal = "cascade"
//! ```

use crate::logging::{default_log_level, normalize_level};
use crate::service::catalog_service::AuthorRemovalPolicy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Overrides `database_path` when set.
pub const DB_PATH_ENV: &str = "CATALOG_DB_PATH";
/// Overrides `log_level` when set.
pub const LOG_LEVEL_ENV: &str = "CATALOG_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "catalog.sqlite3";

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration load/validation failure.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    InvalidValue {
        key: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, .. } => write!(f, "failed to read config `{}`", path.display()),
            Self::Parse(_) => write!(f, "invalid config TOML"),
            Self::InvalidValue { key, message } => write!(f, "invalid `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// SQLite file; relative paths resolve against the working directory.
    pub database_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files. Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub author_removal: AuthorRemovalPolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            author_removal: AuthorRemovalPolicy::default(),
        }
    }
}

impl CatalogConfig {
    /// Reads `path`, parses it, applies process environment overrides and
    /// validates the result.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML content and validates it. No environment lookup.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config = Self::parse(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides resolved by `lookup` (normally `std::env::var`).
    ///
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty =
            |key: &str| lookup(key).filter(|value: &String| !value.trim().is_empty());
        if let Some(path) = non_empty(DB_PATH_ENV) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(level) = non_empty(LOG_LEVEL_ENV) {
            self.log_level = level;
        }
    }

    /// Checks value-level constraints that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "database_path",
                message: "must not be empty".to_string(),
            });
        }
        normalize_level(&self.log_level).map_err(|err| ConfigError::InvalidValue {
            key: "log_level",
            message: err.to_string(),
        })?;
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: "log_dir",
                    message: format!("must be absolute, got `{}`", dir.display()),
                });
            }
        }
        Ok(())
    }

    fn parse(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogConfig, ConfigError, DB_PATH_ENV, LOG_LEVEL_ENV};
    use crate::service::catalog_service::AuthorRemovalPolicy;
    use std::error::Error;
    use std::path::PathBuf;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CatalogConfig::from_toml_str("").unwrap();
        assert_eq!(config, CatalogConfig::default());
        assert_eq!(config.author_removal, AuthorRemovalPolicy::Detach);
    }

    #[test]
    fn parses_all_keys() {
        let config = CatalogConfig::from_toml_str(
            r#"
            database_path = "/tmp/books.sqlite3"
            log_level = "warn"
            log_dir = "/tmp/catalog-logs"
            author_removal = "cascade"
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/books.sqlite3"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/catalog-logs")));
        assert_eq!(config.author_removal, AuthorRemovalPolicy::Cascade);
    }

    #[test]
    fn rejects_unknown_policy_and_unknown_keys() {
        let policy = CatalogConfig::from_toml_str("author_removal = \"orphan\"");
        assert!(matches!(policy, Err(ConfigError::Parse(_))));

        let unknown = CatalogConfig::from_toml_str("cache_size = 10");
        assert!(matches!(unknown, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_bad_level_and_relative_log_dir() {
        let level = CatalogConfig::from_toml_str("log_level = \"loud\"").unwrap_err();
        assert!(matches!(level, ConfigError::InvalidValue { key: "log_level", .. }));

        let dir = CatalogConfig::from_toml_str("log_dir = \"logs\"").unwrap_err();
        assert!(matches!(dir, ConfigError::InvalidValue { key: "log_dir", .. }));
    }

    #[test]
    fn overrides_replace_non_empty_values_only() {
        let mut config = CatalogConfig::default();
        config.apply_overrides(|key| match key {
            DB_PATH_ENV => Some("/data/catalog.db".to_string()),
            LOG_LEVEL_ENV => Some("  ".to_string()),
            _ => None,
        });

        assert_eq!(config.database_path, PathBuf::from("/data/catalog.db"));
        assert_eq!(config.log_level, CatalogConfig::default().log_level);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CatalogConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let cause = err.source().unwrap().to_string();
        assert!(!err.to_string().contains(&cause));
    }

    #[test]
    fn parse_error_keeps_detail_in_source_only() {
        let err = CatalogConfig::from_toml_str("database_path = [").unwrap_err();
        let cause = err.source().unwrap().to_string();
        assert_eq!(err.to_string(), "invalid config TOML");
        assert!(!cause.is_empty());
    }
}
