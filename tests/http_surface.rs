mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use postdeck::application::admin::AdminService;
use postdeck::application::pagination::PaginationOptions;
use postdeck::infra::http::{HttpState, REQUEST_ID_HEADER, build_router};
use postdeck::infra::storage::MemoryStorage;

use common::{Failure, RecordingBackend, client_for, recording_backend};

fn app(backend: &Arc<RecordingBackend>) -> Router {
    let client = client_for(backend);
    let admin = AdminService::new(
        client.clone(),
        Arc::new(MemoryStorage::new()),
        PaginationOptions::default(),
    );
    build_router(HttpState::new(client, admin))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be JSON")
    };
    (status, value)
}

#[tokio::test]
async fn route_surface_serves_lists() {
    let backend = recording_backend();
    let app = app(&backend);

    let (status, users) = send(&app, Method::GET, "/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().map(Vec::len), Some(3));
    assert_eq!(users[0]["first_name"], "Ada");

    let (status, posts) = send(&app, Method::GET, "/blogPosts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(posts[2]["userId"], 2);

    send(&app, Method::GET, "/users", None).await;
    assert_eq!(backend.calls("list_users"), 1);
}

#[tokio::test]
async fn route_surface_reports_routing_failures() {
    let backend = recording_backend();
    let app = app(&backend);

    let (status, body) = send(&app, Method::GET, "/comments", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": 404, "data": "Not Found"}));

    let (status, body) = send(&app, Method::PATCH, "/users", Some(json!(1))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"status": 405, "data": "Method Not Allowed"}));

    let (status, body) = send(&app, Method::DELETE, "/users", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn route_surface_mutations_invalidate_the_cache() {
    let backend = recording_backend();
    let app = app(&backend);

    send(&app, Method::GET, "/users", None).await;
    let (status, body) = send(&app, Method::DELETE, "/users", Some(json!(2))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(true));

    let (_, users) = send(&app, Method::GET, "/users", None).await;
    assert_eq!(users.as_array().map(Vec::len), Some(2));
    assert_eq!(backend.calls("list_users"), 2);

    let (status, body) = send(&app, Method::DELETE, "/users", Some(json!(2))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"status": 500, "data": "User with id 2 not found"}));
}

#[tokio::test]
async fn admin_post_lifecycle() {
    let backend = recording_backend();
    let app = app(&backend);

    let (status, body) = send(
        &app,
        Method::POST,
        "/admin/users/3/posts",
        Some(json!({"title": "Notes", "body": "On structured programming"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Blog post added successfully");
    assert_eq!(body["data"]["userId"], 3);
    let id = body["data"]["id"].as_str().expect("post id").to_string();

    let (_, view) = send(&app, Method::GET, "/admin/users/3/posts", None).await;
    assert_eq!(view["userId"], 3);
    assert_eq!(view["posts"][0]["id"], id.as_str());
    assert!(view["posts"][0]["displayDate"].is_string());

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/admin/posts/{id}"),
        Some(json!({"title": "Revised notes", "body": "Second draft"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Blog post updated successfully");
    assert_eq!(body["data"]["userId"], 3);

    let (_, detail) = send(&app, Method::GET, &format!("/admin/posts/{id}"), None).await;
    assert_eq!(detail["title"], "Revised notes");
    assert_eq!(detail["body"], "Second draft");

    let (status, body) = send(&app, Method::DELETE, &format!("/admin/posts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Blog post deleted successfully");

    let (status, body) = send(&app, Method::GET, &format!("/admin/posts/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Blog post not found");
}

#[tokio::test]
async fn admin_edit_shows_in_user_posts_and_listing() {
    let backend = recording_backend();
    let app = app(&backend);

    let (_, view) = send(&app, Method::GET, "/admin/users/1/posts", None).await;
    assert_eq!(view["posts"].as_array().map(Vec::len), Some(2));

    let (status, _) = send(
        &app,
        Method::PUT,
        "/admin/posts/p1",
        Some(json!({"title": "Revised", "body": "Second draft"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let list_calls = backend.calls("list_blog_posts");

    let (_, view) = send(&app, Method::GET, "/admin/users/1/posts", None).await;
    let titles: Vec<&str> = view["posts"]
        .as_array()
        .expect("posts")
        .iter()
        .filter_map(|post| post["title"].as_str())
        .collect();
    assert!(titles.contains(&"Revised"), "titles: {titles:?}");

    let (_, posts) = send(&app, Method::GET, "/blogPosts", None).await;
    assert!(posts.as_array().expect("posts").iter().any(|post| post["title"] == "Revised"));
    assert_eq!(backend.calls("list_blog_posts"), list_calls);
}

#[tokio::test]
async fn admin_validation_errors_name_the_field() {
    let backend = recording_backend();
    let app = app(&backend);

    let (status, body) = send(
        &app,
        Method::POST,
        "/admin/users/1/posts",
        Some(json!({"title": "  ", "body": "text"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_failed");
    assert_eq!(body["error"]["field"], "title");
    assert_eq!(body["error"]["message"], "Please enter the blog post title");

    let (status, body) = send(
        &app,
        Method::POST,
        "/admin/users/1/posts",
        Some(json!({"title": "x".repeat(101), "body": "text"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"],
        "Title cannot be longer than 100 characters"
    );

    assert_eq!(backend.calls("create_blog_post"), 0);
}

#[tokio::test]
async fn admin_user_table_falls_back_to_last_data() {
    let backend = recording_backend();
    let app = app(&backend);

    let (status, page) = send(&app, Method::GET, "/admin/users?pageSize=20", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["pageSize"], 20);
    assert_eq!(page["total"], 3);
    assert!(page.get("notice").is_none());

    backend.fail("delete_user", Failure::Error("locked"));
    let (status, body) = send(&app, Method::DELETE, "/admin/users/1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "action_failed");
    assert_eq!(body["error"]["message"], "Failed to delete user");

    backend.recover("delete_user");
    backend.fail("list_users", Failure::Error("timeout"));
    let (status, body) = send(&app, Method::DELETE, "/admin/users/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, page) = send(&app, Method::GET, "/admin/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["notice"], "Failed to fetch users");
    assert_eq!(page["total"], 3);
}

#[tokio::test]
async fn admin_user_table_without_data_is_an_error() {
    let backend = recording_backend();
    backend.fail("list_users", Failure::Error("timeout"));
    let app = app(&backend);

    let (status, body) = send(&app, Method::GET, "/admin/users", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "Failed to fetch users");

    let (status, body) = send(&app, Method::GET, "/admin/users?page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn request_ids_are_echoed_or_generated() {
    let backend = recording_backend();
    let app = app(&backend);

    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, "req-42")
        .body(Body::empty())
        .expect("request should build");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).map(|v| v.as_bytes()),
        Some(&b"req-42"[..])
    );

    let request = Request::builder()
        .uri("/comments")
        .body(Body::empty())
        .expect("request should build");
    let response = app.oneshot(request).await.expect("response");
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}
