//! Route adapter: maps a `(path, verb, body)` triple onto exactly one backend call.
//!
//! Routes form a closed enum so every supported `(path, verb)` pair is matched
//! exhaustively. Backend failures, including panics, never cross the adapter
//! boundary; they come back as [`RouteError::ServerError`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use futures::FutureExt;
use metrics::counter;
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::application::backend::{Backend, BackendError};
use crate::domain::entities::{BlogPost, EditBlogPostRequest, PostId, User, UserId};

pub const USERS_PATH: &str = "/users";
pub const BLOG_POSTS_PATH: &str = "/blogPosts";
pub const EDIT_BLOG_POST_PATH: &str = "/blogPosts/edit";

const METRIC_ROUTE_ERROR: &str = "postdeck_route_error_total";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Not Found")]
    NotFound,
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("{message}")]
    ServerError { message: String },
}

impl RouteError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::ServerError {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::NotFound => StatusCode::NOT_FOUND,
            RouteError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RouteError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RouteError::ServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    ListUsers,
    DeleteUser(UserId),
    ListBlogPosts,
    CreateBlogPost(BlogPost),
    DeleteBlogPost(PostId),
    UpdateBlogPost(EditBlogPostRequest),
}

impl Route {
    /// Resolve a string-keyed request into a route.
    ///
    /// Unknown paths fail with `NotFound`, known paths with an unsupported verb
    /// with `MethodNotAllowed`. A missing or malformed body on a route that
    /// needs one fails with `InvalidBody`.
    pub fn resolve(path: &str, method: &Method, body: Option<Value>) -> Result<Self, RouteError> {
        match path {
            USERS_PATH => match method {
                &Method::GET => Ok(Route::ListUsers),
                &Method::DELETE => decode_body(body).map(Route::DeleteUser),
                _ => Err(RouteError::MethodNotAllowed),
            },
            BLOG_POSTS_PATH => match method {
                &Method::GET => Ok(Route::ListBlogPosts),
                &Method::POST => decode_body(body).map(Route::CreateBlogPost),
                &Method::DELETE => decode_body(body).map(Route::DeleteBlogPost),
                _ => Err(RouteError::MethodNotAllowed),
            },
            EDIT_BLOG_POST_PATH => match method {
                &Method::PUT => decode_body(body).map(Route::UpdateBlogPost),
                _ => Err(RouteError::MethodNotAllowed),
            },
            _ => Err(RouteError::NotFound),
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::ListUsers | Route::DeleteUser(_) => USERS_PATH,
            Route::ListBlogPosts | Route::CreateBlogPost(_) | Route::DeleteBlogPost(_) => {
                BLOG_POSTS_PATH
            }
            Route::UpdateBlogPost(_) => EDIT_BLOG_POST_PATH,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Route::ListUsers | Route::ListBlogPosts => Method::GET,
            Route::CreateBlogPost(_) => Method::POST,
            Route::UpdateBlogPost(_) => Method::PUT,
            Route::DeleteUser(_) | Route::DeleteBlogPost(_) => Method::DELETE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::ListUsers => "list_users",
            Route::DeleteUser(_) => "delete_user",
            Route::ListBlogPosts => "list_blog_posts",
            Route::CreateBlogPost(_) => "create_blog_post",
            Route::DeleteBlogPost(_) => "delete_blog_post",
            Route::UpdateBlogPost(_) => "update_blog_post",
        }
    }

    /// Read-only routes are served through the query cache; the rest are mutations.
    pub fn is_query(&self) -> bool {
        matches!(self, Route::ListUsers | Route::ListBlogPosts)
    }
}

fn decode_body<T: DeserializeOwned>(body: Option<Value>) -> Result<T, RouteError> {
    let body = body.ok_or_else(|| RouteError::InvalidBody("missing request body".to_string()))?;
    serde_json::from_value(body).map_err(|err| RouteError::InvalidBody(err.to_string()))
}

/// The result of a successful route call.
///
/// When the backend completes without a payload the adapter substitutes
/// `Deleted(true)` for deletes and `EmptyRecord` for everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutput {
    Users(Vec<User>),
    BlogPosts(Vec<BlogPost>),
    BlogPost(BlogPost),
    Deleted(bool),
    EmptyRecord,
}

impl Serialize for RouteOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RouteOutput::Users(users) => users.serialize(serializer),
            RouteOutput::BlogPosts(posts) => posts.serialize(serializer),
            RouteOutput::BlogPost(post) => post.serialize(serializer),
            RouteOutput::Deleted(deleted) => deleted.serialize(serializer),
            RouteOutput::EmptyRecord => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

#[derive(Clone)]
pub struct RouteAdapter {
    backend: Arc<dyn Backend>,
}

impl RouteAdapter {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Resolve and execute a string-keyed request.
    pub async fn dispatch(
        &self,
        path: &str,
        method: &Method,
        body: Option<Value>,
    ) -> Result<RouteOutput, RouteError> {
        let route = Route::resolve(path, method, body).inspect_err(|err| {
            debug!(path, method = %method, error = %err, "request did not resolve to a route");
        })?;
        self.execute(route).await
    }

    /// Execute a resolved route against the backend, exactly once.
    #[instrument(name = "route_adapter.execute", skip_all, fields(route = route.name()))]
    pub async fn execute(&self, route: Route) -> Result<RouteOutput, RouteError> {
        let name = route.name();

        match AssertUnwindSafe(self.call_backend(route))
            .catch_unwind()
            .await
        {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => Err(server_error(name, &err)),
            Err(payload) => {
                let err = match panic_message(payload.as_ref()) {
                    Some(message) => BackendError::Failed(message),
                    None => BackendError::Unknown,
                };
                Err(server_error(name, &err))
            }
        }
    }

    async fn call_backend(&self, route: Route) -> Result<RouteOutput, BackendError> {
        let output = match route {
            Route::ListUsers => RouteOutput::Users(self.backend.list_users().await?),
            Route::DeleteUser(id) => {
                RouteOutput::Deleted(self.backend.delete_user(id).await?.unwrap_or(true))
            }
            Route::ListBlogPosts => RouteOutput::BlogPosts(self.backend.list_blog_posts().await?),
            Route::CreateBlogPost(post) => self
                .backend
                .create_blog_post(post)
                .await?
                .map_or(RouteOutput::EmptyRecord, RouteOutput::BlogPost),
            Route::DeleteBlogPost(id) => {
                RouteOutput::Deleted(self.backend.delete_blog_post(&id).await?.unwrap_or(true))
            }
            Route::UpdateBlogPost(request) => {
                let id = request.id.clone();
                self.backend
                    .update_blog_post(&id, request.into())
                    .await?
                    .map_or(RouteOutput::EmptyRecord, RouteOutput::BlogPost)
            }
        };
        Ok(output)
    }
}

fn server_error(route: &'static str, err: &BackendError) -> RouteError {
    counter!(METRIC_ROUTE_ERROR, "route" => route).increment(1);
    warn!(route, error = %err, "backend operation failed");
    RouteError::server(err.message())
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        Some((*message).to_string())
    } else {
        payload.downcast_ref::<String>().cloned()
    }
}
