use std::num::NonZeroU32;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::routes::RouteError;
use crate::domain::entities::{BlogPost, UserId};
use crate::domain::error::DomainError;
use crate::domain::posts::format_date;
use crate::domain::users::{SortOrder, UserSortColumn};

pub const USER_TABLE_STORAGE_KEY: &str = "user-table-pagination";

pub const MSG_USER_DELETED: &str = "User deleted successfully";
pub const MSG_USER_DELETE_FAILED: &str = "Failed to delete user";
pub const MSG_USERS_FETCH_FAILED: &str = "Failed to fetch users";
pub const MSG_POST_ADDED: &str = "Blog post added successfully";
pub const MSG_POST_UPDATED: &str = "Blog post updated successfully";
pub const MSG_POST_DELETED: &str = "Blog post deleted successfully";
pub const MSG_POST_DELETE_FAILED: &str = "Failed to delete blog post";
pub const MSG_POSTS_FETCH_FAILED: &str = "Failed to fetch blog posts";
pub const MSG_POST_NOT_FOUND: &str = "Blog post not found";

pub fn add_post_failed(error: &RouteError) -> String {
    format!("Failed to add blog post: {error}")
}

pub fn update_post_failed(error: &RouteError) -> String {
    format!("Failed to update blog post: {error}")
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{0}")]
    NotFound(&'static str),
    /// The action failed; `notification` is what the user is shown.
    #[error("{notification}")]
    Failed {
        notification: String,
        #[source]
        source: RouteError,
    },
}

impl AdminError {
    pub fn failed(notification: impl Into<String>, source: RouteError) -> Self {
        Self::Failed {
            notification: notification.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
            AdminError::Domain(DomainError::Validation { .. }) => StatusCode::BAD_REQUEST,
            AdminError::Domain(DomainError::Timestamp(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AdminError::Failed { source, .. } => source.status(),
        }
    }
}

/// Query string of the user table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTableQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<NonZeroU32>,
    #[serde(default)]
    pub page_size: Option<NonZeroU32>,
    #[serde(default)]
    pub sort: Option<UserSortColumn>,
    #[serde(default)]
    pub order: Option<SortOrder>,
}

/// A post with its display date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: BlogPost,
    pub display_date: String,
}

impl From<BlogPost> for PostView {
    fn from(post: BlogPost) -> Self {
        let display_date = format_date(&post.date_posted);
        Self { post, display_date }
    }
}

/// The expanded row of a user: their posts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPostsView {
    pub user_id: UserId,
    pub posts: Vec<PostView>,
    /// Set when the posts shown are the last ones fetched before a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}
