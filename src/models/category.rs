//! Category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category entity. A post belongs to at most one category; deleting a
/// category leaves its posts in place with a null category reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Display title
    pub title: String,
    /// Free-form description shown on the category page
    pub description: String,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Whether the category appears in public listings
    pub is_published: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for creating a category (privileged tooling and tests)
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
}

impl NewCategory {
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            slug: slug.into(),
            is_published: true,
        }
    }

    pub fn unpublished(mut self) -> Self {
        self.is_published = false;
        self
    }
}
