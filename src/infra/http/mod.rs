mod admin;
mod error;
mod middleware;
mod routes;

pub use error::{ApiError, ApiErrorBody, RouteErrorBody, RouteFailure, codes};
pub use middleware::{REQUEST_ID_HEADER, RequestContext, log_responses, set_request_context};

use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{delete, get},
};

use crate::application::admin::AdminService;
use crate::cache::ApiClient;

#[derive(Clone)]
pub struct HttpState {
    pub client: ApiClient,
    pub admin: AdminService,
}

impl HttpState {
    pub fn new(client: ApiClient, admin: AdminService) -> Self {
        Self { client, admin }
    }
}

/// The full HTTP surface: admin views, health, and the route adapter as the
/// fallback for every other path.
pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/admin/users", get(admin::user_page))
        .route("/admin/users/{id}", delete(admin::delete_user))
        .route(
            "/admin/users/{id}/posts",
            get(admin::user_posts).post(admin::add_post),
        )
        .route(
            "/admin/posts/{id}",
            get(admin::post_detail)
                .put(admin::edit_post)
                .delete(admin::delete_post),
        )
        .fallback(routes::dispatch_route)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
