//! Publisher entity.

/// A publishing house, keyed by its name. Carries no other attributes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Publisher {
    pub publisher_name: String,
}

impl Publisher {
    pub fn new(publisher_name: impl Into<String>) -> Self {
        Self {
            publisher_name: publisher_name.into(),
        }
    }
}
