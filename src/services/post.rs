//! Post service
//!
//! Feed composition and post lifecycle. Every listing goes through the same
//! stages: resolve the scope (whole site, one category, one author), apply
//! the visibility predicate unless the viewer is the author, let the
//! repository annotate and order, then slice the requested page.

use crate::db::repositories::{CategoryRepository, LocationRepository, PostRepository};
use crate::services::authz;
use crate::models::{
    Category, CreatePostInput, FeedScope, ListParams, Location, PagedResult, Post, PostDetail,
    UpdatePostInput, User,
};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// The post (or the category scoping a feed) does not exist or is not
    /// visible to the requester
    #[error("Post not found")]
    NotFound,

    /// The requested page lies past the end of the listing
    #[error("Page out of range")]
    PageOutOfRange,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Post service
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    categories: Arc<dyn CategoryRepository>,
    locations: Arc<dyn LocationRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        categories: Arc<dyn CategoryRepository>,
        locations: Arc<dyn LocationRepository>,
    ) -> Self {
        Self {
            posts,
            categories,
            locations,
        }
    }

    /// Create a post
    pub async fn create(&self, input: &CreatePostInput) -> Result<Post, PostServiceError> {
        let post = self
            .posts
            .create(input)
            .await
            .context("Failed to create post")?;
        Ok(post)
    }

    /// Get a bare post row, for authorization checks and edit forms
    pub async fn find(&self, id: i64) -> Result<Post, PostServiceError> {
        self.posts
            .get_by_id(id)
            .await
            .context("Failed to load post")?
            .ok_or(PostServiceError::NotFound)
    }

    /// Fetch one post for display.
    ///
    /// The author sees their post in any state; everyone else only gets it
    /// when the visibility predicate holds, otherwise the post does not
    /// exist as far as they are concerned.
    pub async fn detail_for(
        &self,
        viewer: Option<&User>,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<PostDetail, PostServiceError> {
        let detail = self
            .posts
            .get_detail(id)
            .await
            .context("Failed to load post detail")?
            .ok_or(PostServiceError::NotFound)?;

        let is_author = viewer
            .map(|v| authz::is_author(v, detail.post.author_id))
            .unwrap_or(false);
        if !is_author && !detail.is_visible_at(now) {
            return Err(PostServiceError::NotFound);
        }

        Ok(detail)
    }

    /// The public feed: visible posts site-wide
    pub async fn public_feed(
        &self,
        params: ListParams,
        now: DateTime<Utc>,
    ) -> Result<PagedResult<PostDetail>, PostServiceError> {
        self.paged(FeedScope::All, true, now, params).await
    }

    /// Posts of one published category; an unknown or unpublished slug reads
    /// as not-found
    pub async fn category_feed(
        &self,
        slug: &str,
        params: ListParams,
        now: DateTime<Utc>,
    ) -> Result<(Category, PagedResult<PostDetail>), PostServiceError> {
        let category = self
            .categories
            .get_by_slug(slug)
            .await
            .context("Failed to load category")?
            .filter(|c| c.is_published)
            .ok_or(PostServiceError::NotFound)?;

        let page = self
            .paged(FeedScope::Category(category.id), true, now, params)
            .await?;

        Ok((category, page))
    }

    /// Posts authored by one user. With `include_hidden` (the author viewing
    /// their own profile) the visibility predicate is skipped.
    pub async fn profile_feed(
        &self,
        author: &User,
        include_hidden: bool,
        params: ListParams,
        now: DateTime<Utc>,
    ) -> Result<PagedResult<PostDetail>, PostServiceError> {
        self.paged(FeedScope::Author(author.id), !include_hidden, now, params)
            .await
    }

    /// Update a post
    pub async fn update(
        &self,
        id: i64,
        input: &UpdatePostInput,
    ) -> Result<Post, PostServiceError> {
        let post = self
            .posts
            .update(id, input)
            .await
            .context("Failed to update post")?;
        Ok(post)
    }

    /// Delete a post
    pub async fn delete(&self, id: i64) -> Result<(), PostServiceError> {
        self.posts.delete(id).await.context("Failed to delete post")?;
        Ok(())
    }

    /// Published categories and locations for the post form selects
    pub async fn form_choices(
        &self,
    ) -> Result<(Vec<Category>, Vec<Location>), PostServiceError> {
        let categories = self
            .categories
            .list_published()
            .await
            .context("Failed to list categories")?;
        let locations = self
            .locations
            .list_published()
            .await
            .context("Failed to list locations")?;
        Ok((categories, locations))
    }

    async fn paged(
        &self,
        scope: FeedScope,
        published_only: bool,
        now: DateTime<Utc>,
        params: ListParams,
    ) -> Result<PagedResult<PostDetail>, PostServiceError> {
        let total = self
            .posts
            .count_feed(scope, published_only, now)
            .await
            .context("Failed to count feed")?;

        if params.exceeds(total) {
            return Err(PostServiceError::PageOutOfRange);
        }

        let items = self
            .posts
            .list_feed(scope, published_only, now, params.offset(), params.limit())
            .await
            .context("Failed to list feed")?;

        Ok(PagedResult::new(items, total, &params))
    }
}
