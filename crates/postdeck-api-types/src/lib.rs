//! Wire types shared between the postdeck server and its clients.
//!
//! Field names follow the JSON the data module has always produced: users keep
//! their snake_case columns, blog posts use camelCase (`userId`, `datePosted`).

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// A registered user. Records are replaced wholesale on refetch, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: String,
    pub ip_address: String,
}

/// A blog post owned by a user. `user_id` does not change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub body: String,
    pub user_id: i64,
    /// ISO-8601 timestamp.
    pub date_posted: String,
}

/// Body of `PUT /blogPosts/edit`. The post text travels as `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBlogPostRequest {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date_posted: String,
    pub user_id: i64,
}

/// Replacement fields handed to the persistence backend when a post is edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostFields {
    pub title: String,
    pub body: String,
    pub user_id: i64,
    pub date_posted: String,
}

impl From<EditBlogPostRequest> for BlogPostFields {
    fn from(request: EditBlogPostRequest) -> Self {
        Self {
            title: request.title,
            body: request.content,
            user_id: request.user_id,
            date_posted: request.date_posted,
        }
    }
}

/// Title and body submitted from the add/edit post forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
}

/// The persisted subset of a table's pagination state.
///
/// Zero is rejected on deserialization, so a stored `{"current":0}` is treated
/// as malformed rather than trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationSnapshot {
    pub current: NonZeroU32,
    pub page_size: NonZeroU32,
}

/// One page of a paginated admin table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub current: u32,
    pub page_size: u32,
    pub total: usize,
    pub page_size_options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Result of an admin action: the notification to show and the affected record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse<T> {
    pub message: String,
    pub data: T,
}
