//! Repository layer
//!
//! One trait per entity, each implemented for both SQLite and MySQL via the
//! shared `DynDatabasePool` abstraction.

pub mod category;
pub mod comment;
pub mod location;
pub mod post;
pub mod session;
pub mod user;

pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use location::{LocationRepository, SqlxLocationRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
