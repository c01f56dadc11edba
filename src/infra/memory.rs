//! In-memory persistence backend seeded from JSON.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::application::backend::{Backend, BackendError};
use crate::domain::entities::{BlogPost, BlogPostFields, User, UserId};

use super::error::InfraError;

const BUILTIN_SEED: &str = include_str!("../../data/seed.json");

/// The users and blog posts a backend starts with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default, rename = "blogPosts")]
    pub blog_posts: Vec<BlogPost>,
}

impl SeedData {
    pub fn builtin() -> Result<Self, InfraError> {
        serde_json::from_str(BUILTIN_SEED)
            .map_err(|err| InfraError::seed("built-in seed", err))
    }

    pub async fn from_file(path: &Path) -> Result<Self, InfraError> {
        let raw = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&raw)
            .map_err(|err| InfraError::seed(path.display().to_string(), err))
    }

    /// Seed from `path` when given, otherwise the built-in data set.
    pub async fn load(path: Option<&Path>) -> Result<Self, InfraError> {
        let seed = match path {
            Some(path) => Self::from_file(path).await?,
            None => Self::builtin()?,
        };
        info!(
            users = seed.users.len(),
            blog_posts = seed.blog_posts.len(),
            source = path.map_or("builtin".to_string(), |p| p.display().to_string()),
            "seed data loaded"
        );
        Ok(seed)
    }
}

/// Holds users and posts in process memory.
///
/// Deleting a user leaves that user's posts in place.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<SeedData>,
}

impl InMemoryBackend {
    pub fn new(seed: SeedData) -> Self {
        Self {
            data: RwLock::new(seed),
        }
    }

    pub async fn snapshot(&self) -> SeedData {
        self.data.read().await.clone()
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn list_users(&self) -> Result<Vec<User>, BackendError> {
        Ok(self.data.read().await.users.clone())
    }

    async fn delete_user(&self, id: UserId) -> Result<Option<bool>, BackendError> {
        let mut data = self.data.write().await;
        let before = data.users.len();
        data.users.retain(|user| user.id != id);
        if data.users.len() == before {
            return Err(BackendError::failed(format!("User with id {id} not found")));
        }
        debug!(user_id = id, "user deleted");
        Ok(Some(true))
    }

    async fn list_blog_posts(&self) -> Result<Vec<BlogPost>, BackendError> {
        Ok(self.data.read().await.blog_posts.clone())
    }

    async fn create_blog_post(&self, post: BlogPost) -> Result<Option<BlogPost>, BackendError> {
        let mut data = self.data.write().await;
        if data.blog_posts.iter().any(|existing| existing.id == post.id) {
            return Err(BackendError::failed(format!(
                "Blog post with id {} already exists",
                post.id
            )));
        }
        debug!(post_id = %post.id, user_id = post.user_id, "blog post created");
        data.blog_posts.push(post.clone());
        Ok(Some(post))
    }

    async fn delete_blog_post(&self, id: &str) -> Result<Option<bool>, BackendError> {
        let mut data = self.data.write().await;
        let before = data.blog_posts.len();
        data.blog_posts.retain(|post| post.id != id);
        if data.blog_posts.len() == before {
            return Err(BackendError::failed(format!(
                "Blog post with id {id} not found"
            )));
        }
        debug!(post_id = id, "blog post deleted");
        Ok(Some(true))
    }

    async fn update_blog_post(
        &self,
        id: &str,
        fields: BlogPostFields,
    ) -> Result<Option<BlogPost>, BackendError> {
        let mut data = self.data.write().await;
        let Some(post) = data.blog_posts.iter_mut().find(|post| post.id == id) else {
            return Err(BackendError::failed(format!(
                "Blog post with id {id} not found"
            )));
        };
        if post.user_id != fields.user_id {
            return Err(BackendError::failed(format!(
                "Blog post {id} belongs to user {} and cannot be moved",
                post.user_id
            )));
        }

        post.title = fields.title;
        post.body = fields.body;
        post.date_posted = fields.date_posted;
        debug!(post_id = id, "blog post updated");
        Ok(Some(post.clone()))
    }
}
