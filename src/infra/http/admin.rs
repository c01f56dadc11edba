//! Admin JSON views.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};

use postdeck_api_types::{ActionResponse, PageResponse};

use crate::application::admin::{PostView, UserPostsView, UserTableQuery};
use crate::domain::entities::{BlogPost, PostDraft, PostId, User, UserId};

use super::HttpState;
use super::error::ApiError;

pub(super) async fn user_page(
    State(state): State<HttpState>,
    query: Result<Query<UserTableQuery>, QueryRejection>,
) -> Result<Json<PageResponse<User>>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    Ok(Json(state.admin.user_page(query).await?))
}

pub(super) async fn delete_user(
    State(state): State<HttpState>,
    Path(id): Path<UserId>,
) -> Result<Json<ActionResponse<UserId>>, ApiError> {
    Ok(Json(state.admin.delete_user(id).await?))
}

pub(super) async fn user_posts(
    State(state): State<HttpState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserPostsView>, ApiError> {
    Ok(Json(state.admin.user_posts(id).await?))
}

pub(super) async fn add_post(
    State(state): State<HttpState>,
    Path(id): Path<UserId>,
    draft: Result<Json<PostDraft>, JsonRejection>,
) -> Result<Json<ActionResponse<BlogPost>>, ApiError> {
    let Json(draft) = draft.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    Ok(Json(state.admin.add_post(id, draft).await?))
}

pub(super) async fn post_detail(
    State(state): State<HttpState>,
    Path(id): Path<PostId>,
) -> Result<Json<PostView>, ApiError> {
    Ok(Json(state.admin.post_detail(&id).await?))
}

pub(super) async fn edit_post(
    State(state): State<HttpState>,
    Path(id): Path<PostId>,
    draft: Result<Json<PostDraft>, JsonRejection>,
) -> Result<Json<ActionResponse<BlogPost>>, ApiError> {
    let Json(draft) = draft.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    Ok(Json(state.admin.edit_post(&id, draft).await?))
}

pub(super) async fn delete_post(
    State(state): State<HttpState>,
    Path(id): Path<PostId>,
) -> Result<Json<ActionResponse<PostId>>, ApiError> {
    Ok(Json(state.admin.delete_post(&id).await?))
}
