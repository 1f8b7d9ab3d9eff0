//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity. Comments belong to a post and an author; deleting either
/// deletes the comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: i64,
    /// Comment body text
    pub body: String,
    /// Creation timestamp; threads are ordered by it ascending
    pub created_at: DateTime<Utc>,
    /// Author user ID
    pub author_id: i64,
    /// Post the comment belongs to
    pub post_id: i64,
}

/// A comment joined with its author's username for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentDetail {
    #[serde(flatten)]
    pub comment: Comment,
    /// Username of the author
    pub author_username: String,
}

/// Input for creating a comment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub body: String,
    pub author_id: i64,
    pub post_id: i64,
}
