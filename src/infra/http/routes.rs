//! String-keyed route surface: `/users`, `/blogPosts`, `/blogPosts/edit`.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, Uri};
use serde_json::Value;

use crate::application::routes::{Route, RouteError};

use super::HttpState;
use super::error::RouteFailure;

/// Fallback handler: every request not claimed by another route is resolved
/// by the route adapter, reads going through the query cache.
pub(super) async fn dispatch_route(
    State(state): State<HttpState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<Json<Value>, RouteFailure> {
    let path = uri.path();
    let body = read_body(path, &method, &body)?;
    let value = state.client.dispatch(path, &method, body).await?;
    Ok(Json(value))
}

/// Parse the JSON body, if any. An unreadable body only matters once the path
/// and verb are known to need one.
fn read_body(path: &str, method: &Method, raw: &[u8]) -> Result<Option<Value>, RouteError> {
    if raw.is_empty() || *method == Method::GET || *method == Method::HEAD {
        return Ok(None);
    }

    match serde_json::from_slice(raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => match Route::resolve(path, method, None) {
            Err(RouteError::NotFound) => Err(RouteError::NotFound),
            Err(RouteError::MethodNotAllowed) => Err(RouteError::MethodNotAllowed),
            _ => Err(RouteError::InvalidBody(err.to_string())),
        },
    }
}
