//! User model
//!
//! The user is the identity behind every post and comment. Access control in
//! Chronica is purely authorship-based: a user may edit or delete exactly the
//! posts and comments they created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Optional given name
    pub first_name: String,
    /// Optional family name
    pub last_name: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            first_name: String::new(),
            last_name: String::new(),
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Display name: full name if present, otherwise the username
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Input for updating a user's own profile fields
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}
