//! Admin views over users and blog posts.

mod posts;
mod service;
mod types;
mod users;

pub use service::AdminService;
pub use types::{
    AdminError, MSG_POST_ADDED, MSG_POST_DELETE_FAILED, MSG_POST_DELETED, MSG_POST_NOT_FOUND,
    MSG_POST_UPDATED, MSG_POSTS_FETCH_FAILED, MSG_USER_DELETE_FAILED, MSG_USER_DELETED,
    MSG_USERS_FETCH_FAILED, PostView, USER_TABLE_STORAGE_KEY, UserPostsView, UserTableQuery,
    add_post_failed, update_post_failed,
};
