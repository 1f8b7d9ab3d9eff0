//! Post model
//!
//! This module provides:
//! - `Post` entity representing a blog post
//! - `PostDetail` with the eagerly joined author/category/location data and
//!   comment count used by list and detail pages
//! - Input types for creating and updating posts
//! - The visibility predicate deciding which posts are public

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// Post title
    pub title: String,
    /// Post body text
    pub body: String,
    /// Uploaded image path relative to the media root
    pub image: Option<String>,
    /// Scheduled publication timestamp; future dates delay visibility
    pub pub_date: DateTime<Utc>,
    /// Whether the author has published the post
    pub is_published: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Author user ID
    pub author_id: i64,
    /// Category ID (optional)
    pub category_id: Option<i64>,
    /// Location ID (optional)
    pub location_id: Option<i64>,
}

/// A post joined with its related display data.
///
/// Author, category and location are resolved in the same query as the post
/// itself, and `comment_count` is aggregated alongside, so rendering a page
/// of posts costs a single round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    /// Username of the author
    pub author_username: String,
    /// Title of the category, if any
    pub category_title: Option<String>,
    /// Slug of the category, if any
    pub category_slug: Option<String>,
    /// Published flag of the category, if any
    pub category_is_published: Option<bool>,
    /// Name of the location, if any
    pub location_name: Option<String>,
    /// Number of comments on the post
    pub comment_count: i64,
}

impl PostDetail {
    /// The visibility predicate: whether this post appears in public
    /// listings at the given instant.
    ///
    /// A post is visible iff its own published flag is set, its category
    /// exists and is published, and its scheduled publication time has
    /// passed. A post without a category is never publicly visible; its
    /// author still sees it everywhere.
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.post.is_published
            && self.category_is_published == Some(true)
            && self.post.pub_date <= now
    }
}

/// Input for creating a new post
#[derive(Debug, Clone)]
pub struct CreatePostInput {
    /// Post title
    pub title: String,
    /// Post body text
    pub body: String,
    /// Uploaded image path, if an image was attached
    pub image: Option<String>,
    /// Scheduled publication timestamp
    pub pub_date: DateTime<Utc>,
    /// Published flag
    pub is_published: bool,
    /// Author user ID
    pub author_id: i64,
    /// Category ID (optional)
    pub category_id: Option<i64>,
    /// Location ID (optional)
    pub location_id: Option<i64>,
}

/// Input for updating an existing post.
///
/// The edit form resubmits the full field set, so every field replaces the
/// stored value; `image` is the exception and keeps the stored file when no
/// new upload is provided.
#[derive(Debug, Clone)]
pub struct UpdatePostInput {
    pub title: String,
    pub body: String,
    /// Replacement image path; `None` keeps the existing image
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
}

/// Which collection of posts a feed query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Every post
    All,
    /// Posts in one category
    Category(i64),
    /// Posts by one author
    Author(i64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn detail(
        is_published: bool,
        category_is_published: Option<bool>,
        pub_date: DateTime<Utc>,
    ) -> PostDetail {
        PostDetail {
            post: Post {
                id: 1,
                title: "Title".into(),
                body: "Body".into(),
                image: None,
                pub_date,
                is_published,
                created_at: Utc::now(),
                author_id: 1,
                category_id: category_is_published.map(|_| 1),
                location_id: None,
            },
            author_username: "author".into(),
            category_title: category_is_published.map(|_| "Category".to_string()),
            category_slug: category_is_published.map(|_| "category".to_string()),
            category_is_published,
            location_name: None,
            comment_count: 0,
        }
    }

    #[test]
    fn test_visible_when_all_conditions_hold() {
        let now = Utc::now();
        let d = detail(true, Some(true), now - Duration::hours(1));
        assert!(d.is_visible_at(now));
    }

    #[test]
    fn test_hidden_when_unpublished() {
        let now = Utc::now();
        let d = detail(false, Some(true), now - Duration::hours(1));
        assert!(!d.is_visible_at(now));
    }

    #[test]
    fn test_hidden_when_category_unpublished() {
        let now = Utc::now();
        let d = detail(true, Some(false), now - Duration::hours(1));
        assert!(!d.is_visible_at(now));
    }

    #[test]
    fn test_hidden_when_category_missing() {
        let now = Utc::now();
        let d = detail(true, None, now - Duration::hours(1));
        assert!(!d.is_visible_at(now));
    }

    #[test]
    fn test_hidden_when_scheduled_in_future() {
        let now = Utc::now();
        let d = detail(true, Some(true), now + Duration::days(1));
        assert!(!d.is_visible_at(now));
    }

    #[test]
    fn test_visible_exactly_at_pub_date() {
        let now = Utc::now();
        let d = detail(true, Some(true), now);
        assert!(d.is_visible_at(now));
    }

    #[test]
    fn test_future_post_becomes_visible_later() {
        let now = Utc::now();
        let d = detail(true, Some(true), now + Duration::days(1));
        assert!(!d.is_visible_at(now));
        assert!(d.is_visible_at(now + Duration::days(2)));
    }
}
