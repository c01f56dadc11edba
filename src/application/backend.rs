//! Persistence backend capability consumed by the route adapter.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{BlogPost, BlogPostFields, User, UserId};

pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred";

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The backend raised an error with a message.
    #[error("{0}")]
    Failed(String),
    /// The backend failed without anything describable.
    #[error("Unknown error occurred")]
    Unknown,
}

impl BackendError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            BackendError::Failed(message) => message,
            BackendError::Unknown => UNKNOWN_ERROR_MESSAGE,
        }
    }
}

/// The five data-module operations over users and blog posts.
///
/// `Ok(None)` means the operation completed without returning a payload.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, BackendError>;

    async fn delete_user(&self, id: UserId) -> Result<Option<bool>, BackendError>;

    async fn list_blog_posts(&self) -> Result<Vec<BlogPost>, BackendError>;

    async fn create_blog_post(&self, post: BlogPost) -> Result<Option<BlogPost>, BackendError>;

    async fn delete_blog_post(&self, id: &str) -> Result<Option<bool>, BackendError>;

    async fn update_blog_post(
        &self,
        id: &str,
        fields: BlogPostFields,
    ) -> Result<Option<BlogPost>, BackendError>;
}
