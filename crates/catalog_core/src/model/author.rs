//! Author entity.

use chrono::NaiveDate;

/// A book author, keyed by name.
///
/// Ordering is by name first, so author sets iterate alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Author {
    /// Natural key; unique across the catalog.
    pub name: String,
    pub birth_date: NaiveDate,
}

impl Author {
    pub fn new(name: impl Into<String>, birth_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            birth_date,
        }
    }
}
