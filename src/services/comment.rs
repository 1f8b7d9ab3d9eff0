//! Comment service

use crate::db::repositories::CommentRepository;
use crate::models::{Comment, CommentDetail, ListParams, NewComment, PagedResult};
use anyhow::Context;
use std::sync::Arc;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// The comment does not exist
    #[error("Comment not found")]
    NotFound,

    /// The requested page lies past the end of the thread
    #[error("Page out of range")]
    PageOutOfRange,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Comment service
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentRepository>) -> Self {
        Self { repo }
    }

    /// Add a comment to a post
    pub async fn add(&self, input: NewComment) -> Result<Comment, CommentServiceError> {
        let comment = self
            .repo
            .create(&input)
            .await
            .context("Failed to create comment")?;
        Ok(comment)
    }

    /// Get a comment, for authorization checks and edit forms
    pub async fn find(&self, id: i64) -> Result<Comment, CommentServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to load comment")?
            .ok_or(CommentServiceError::NotFound)
    }

    /// Replace the body of a comment
    pub async fn edit(&self, id: i64, body: &str) -> Result<Comment, CommentServiceError> {
        let comment = self
            .repo
            .update_body(id, body)
            .await
            .context("Failed to update comment")?;
        Ok(comment)
    }

    /// Delete a comment
    pub async fn remove(&self, id: i64) -> Result<(), CommentServiceError> {
        self.repo
            .delete(id)
            .await
            .context("Failed to delete comment")?;
        Ok(())
    }

    /// A page of a post's thread, oldest first
    pub async fn thread(
        &self,
        post_id: i64,
        params: ListParams,
    ) -> Result<PagedResult<CommentDetail>, CommentServiceError> {
        let total = self
            .repo
            .count_by_post(post_id)
            .await
            .context("Failed to count comments")?;

        if params.exceeds(total) {
            return Err(CommentServiceError::PageOutOfRange);
        }

        let items = self
            .repo
            .list_by_post(post_id, params.offset(), params.limit())
            .await
            .context("Failed to list comments")?;

        Ok(PagedResult::new(items, total, &params))
    }
}
