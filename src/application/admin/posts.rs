use time::OffsetDateTime;
use tracing::{info, warn};

use postdeck_api_types::ActionResponse;

use crate::domain::entities::{BlogPost, EditBlogPostRequest, PostDraft, PostId, UserId};
use crate::domain::posts::{new_blog_post, validate_edit_draft};

use super::service::AdminService;
use super::types::{
    AdminError, MSG_POST_ADDED, MSG_POST_DELETE_FAILED, MSG_POST_DELETED, MSG_POST_NOT_FOUND,
    MSG_POST_UPDATED, MSG_POSTS_FETCH_FAILED, PostView, UserPostsView, add_post_failed,
    update_post_failed,
};

impl AdminService {
    /// Posts of one user, for the expanded user row.
    pub async fn user_posts(&self, user_id: UserId) -> Result<UserPostsView, AdminError> {
        let (posts, notice) = match self.client.posts_for_user(user_id).await {
            Ok(posts) => (posts, None),
            Err(err) => match err.stale {
                Some(posts) => {
                    warn!(user_id, error = %err.error, "showing last fetched blog posts");
                    (posts, Some(MSG_POSTS_FETCH_FAILED.to_string()))
                }
                None => return Err(AdminError::failed(MSG_POSTS_FETCH_FAILED, err.error)),
            },
        };

        Ok(UserPostsView {
            user_id,
            posts: posts.into_iter().map(PostView::from).collect(),
            notice,
        })
    }

    pub async fn post_detail(&self, id: &str) -> Result<PostView, AdminError> {
        let post = match self.client.blog_post(id).await {
            Ok(post) => post,
            Err(err) => match err.stale {
                Some(post) => post,
                None => return Err(AdminError::failed(MSG_POSTS_FETCH_FAILED, err.error)),
            },
        };
        post.map(PostView::from)
            .ok_or(AdminError::NotFound(MSG_POST_NOT_FOUND))
    }

    /// Validate a draft and create it as a new post of `user_id`.
    pub async fn add_post(
        &self,
        user_id: UserId,
        draft: PostDraft,
    ) -> Result<ActionResponse<BlogPost>, AdminError> {
        let post = new_blog_post(user_id, draft, OffsetDateTime::now_utc())?;
        let id = post.id.clone();

        match self.client.add_blog_post(post).await {
            Ok(created) => {
                info!(post_id = %id, user_id, "blog post added");
                Ok(ActionResponse {
                    message: MSG_POST_ADDED.to_string(),
                    data: created,
                })
            }
            Err(err) => Err(AdminError::failed(add_post_failed(&err), err)),
        }
    }

    /// Replace the title and body of a post, keeping its owner and date.
    pub async fn edit_post(
        &self,
        id: &str,
        draft: PostDraft,
    ) -> Result<ActionResponse<BlogPost>, AdminError> {
        validate_edit_draft(&draft)?;
        let current = self.post_detail(id).await?.post;

        let request = EditBlogPostRequest {
            id: current.id,
            title: draft.title,
            content: draft.body,
            date_posted: current.date_posted,
            user_id: current.user_id,
        };
        match self.client.edit_blog_post(request).await {
            Ok(updated) => {
                info!(post_id = id, "blog post updated");
                Ok(ActionResponse {
                    message: MSG_POST_UPDATED.to_string(),
                    data: updated,
                })
            }
            Err(err) => Err(AdminError::failed(update_post_failed(&err), err)),
        }
    }

    pub async fn delete_post(&self, id: &str) -> Result<ActionResponse<PostId>, AdminError> {
        match self.client.delete_blog_post(id).await {
            Ok(_) => {
                info!(post_id = id, "blog post deleted");
                Ok(ActionResponse {
                    message: MSG_POST_DELETED.to_string(),
                    data: id.to_string(),
                })
            }
            Err(err) => Err(AdminError::failed(MSG_POST_DELETE_FAILED, err)),
        }
    }
}
