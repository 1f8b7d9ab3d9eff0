//! Authorization decisions
//!
//! Access control in Chronica is authorship-based: a user may mutate exactly
//! the posts and comments they created. Handlers call these functions
//! explicitly before every edit or delete.
//!
//! A denied mutation is a "soft deny": instead of an error page, the actor is
//! redirected to the read-only detail view of the post involved.

use crate::models::{Comment, Post, User};

/// Outcome of an authorization check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The actor may perform the mutation
    Allow,
    /// The actor may not; send them to the given path instead
    DenyWithRedirect(String),
}

impl Decision {
    /// Whether the mutation may proceed
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Whether the actor authored the resource with the given author id
pub fn is_author(actor: &User, author_id: i64) -> bool {
    actor.id == author_id
}

/// Authorize editing or deleting a post
pub fn authorize_post(actor: &User, post: &Post) -> Decision {
    if is_author(actor, post.author_id) {
        Decision::Allow
    } else {
        Decision::DenyWithRedirect(format!("/posts/{}", post.id))
    }
}

/// Authorize editing or deleting a comment
pub fn authorize_comment(actor: &User, comment: &Comment) -> Decision {
    if is_author(actor, comment.author_id) {
        Decision::Allow
    } else {
        Decision::DenyWithRedirect(format!("/posts/{}", comment.post_id))
    }
}
