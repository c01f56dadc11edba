//! Domain entities as they travel between the backend, the cache and the admin views.

pub use postdeck_api_types::{BlogPost, BlogPostFields, EditBlogPostRequest, PostDraft, User};

/// Users are keyed by a stable integer id.
pub type UserId = i64;

/// Posts are keyed by a caller-generated string id.
pub type PostId = String;
