//! Location model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Location entity. A post may reference one location; deleting a location
/// leaves its posts in place with a null location reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Whether the location may be attached to new posts
    pub is_published: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for creating a location (privileged tooling and tests)
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub name: String,
    pub is_published: bool,
}

impl NewLocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_published: true,
        }
    }
}
