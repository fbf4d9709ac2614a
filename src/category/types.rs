//! Category types.

use serde::Serialize;

/// Category id used for news items that match no category.
///
/// This is a placeholder, not a row in the categories table.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Default page size for category scans.
pub const CATEGORY_PAGE_SIZE: usize = 50;

/// Upper bound for a caller-supplied page size.
pub const MAX_CATEGORY_PAGE_SIZE: usize = 100;

/// A news category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Category {
    /// Category ID (UUID).
    pub id: String,
    /// Display name, unique ignoring case.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// When the category was created.
    pub created_at: String,
    /// When the category was last updated.
    pub updated_at: String,
}

/// New category for creation.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

impl NewCategory {
    /// Create a new category with a trimmed name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().trim().to_string(),
            description: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial category update.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CategoryUpdate {
    /// Returns true if nothing would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}
