use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, AuthResponse, Category, ErrorBody, Post, Tag};
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(String::new()).unwrap()
}

type App = axum::routing::RouterIntoService<String>;

async fn call(app: &mut App, request: Request<String>) -> axum::response::Response {
    ServiceExt::ready(app).await.unwrap().call(request).await.unwrap()
}

async fn login(app: &mut App) -> String {
    let resp = call(
        app,
        json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            r#"{"email":"user@test.com","password":"password"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let auth: AuthResponse = body_json(resp).await;
    auth.token
}

// --- auth ---

#[tokio::test]
async fn login_issues_token() {
    let mut app = app().into_service();
    let token = login(&mut app).await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            r#"{"email":"user@test.com","password":"nope"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let err: ErrorBody = body_json(resp).await;
    assert_eq!(err.status, 401);
    assert_eq!(err.message, "Incorrect email or password");
}

// --- categories ---

#[tokio::test]
async fn list_categories_empty() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/v1/categories", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let categories: Vec<Category> = body_json(resp).await;
    assert!(categories.is_empty());
}

#[tokio::test]
async fn create_category_requires_token() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/categories", None, r#"{"name":"Rust"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let err: ErrorBody = body_json(resp).await;
    assert_eq!(err.status, 401);
}

#[tokio::test]
async fn create_category_rejects_unknown_token() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/categories",
            Some("forged"),
            r#"{"name":"Rust"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_category_blank_name_is_400_with_field_errors() {
    let mut app = app().into_service();
    let token = login(&mut app).await;

    let resp = call(
        &mut app,
        json_request("POST", "/api/v1/categories", Some(&token), r#"{"name":"  "}"#),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorBody = body_json(resp).await;
    let errors = err.errors.unwrap();
    assert_eq!(errors[0].field, "name");
}

#[tokio::test]
async fn duplicate_category_is_409() {
    let mut app = app().into_service();
    let token = login(&mut app).await;

    let body = r#"{"name":"Rust"}"#;
    let resp = call(&mut app, json_request("POST", "/api/v1/categories", Some(&token), body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = call(&mut app, json_request("POST", "/api/v1/categories", Some(&token), body)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_json_returns_422() {
    let mut app = app().into_service();
    let token = login(&mut app).await;

    let resp = call(
        &mut app,
        json_request("POST", "/api/v1/categories", Some(&token), r#"{"not_name":1}"#),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- tags ---

#[tokio::test]
async fn create_tags_reuses_existing_names() {
    let mut app = app().into_service();
    let token = login(&mut app).await;

    let resp = call(
        &mut app,
        json_request("POST", "/api/v1/tags", Some(&token), r#"{"names":["rust","async"]}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first: Vec<Tag> = body_json(resp).await;
    assert_eq!(first.len(), 2);

    let resp = call(
        &mut app,
        json_request("POST", "/api/v1/tags", Some(&token), r#"{"names":["Rust","web"]}"#),
    )
    .await;
    let second: Vec<Tag> = body_json(resp).await;
    assert_eq!(second[0].id, first[0].id);
    assert_eq!(second[1].name, "web");

    let resp = call(&mut app, empty_request("GET", "/api/v1/tags", None)).await;
    let all: Vec<Tag> = body_json(resp).await;
    let names: Vec<&str> = all.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["async", "rust", "web"]);
}

#[tokio::test]
async fn delete_tag_not_found() {
    let mut app = app().into_service();
    let token = login(&mut app).await;
    let resp = call(&mut app, empty_request("DELETE", "/api/v1/tags/missing", Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- posts ---

#[tokio::test]
async fn get_post_not_found_has_error_body() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/v1/posts/missing", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let err: ErrorBody = body_json(resp).await;
    assert_eq!(err.message, "Post not found");
}

#[tokio::test]
async fn create_post_with_unknown_category_is_400() {
    let mut app = app().into_service();
    let token = login(&mut app).await;

    let resp = call(
        &mut app,
        json_request(
            "POST",
            "/api/v1/posts",
            Some(&token),
            r#"{"title":"t","content":"c","categoryId":"nope","tagIds":[],"status":"DRAFT"}"#,
        ),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorBody = body_json(resp).await;
    assert_eq!(err.errors.unwrap()[0].field, "categoryId");
}

// --- full lifecycle ---

#[tokio::test]
async fn post_lifecycle() {
    let mut app = app().into_service();
    let token = login(&mut app).await;

    // category + tag
    let resp = call(
        &mut app,
        json_request("POST", "/api/v1/categories", Some(&token), r#"{"name":"Rust"}"#),
    )
    .await;
    let category: Category = body_json(resp).await;
    let resp = call(
        &mut app,
        json_request("POST", "/api/v1/tags", Some(&token), r#"{"names":["async"]}"#),
    )
    .await;
    let tags: Vec<Tag> = body_json(resp).await;
    let tag_id = tags[0].id.clone();

    // create
    let body = serde_json::json!({
        "title": "Hello",
        "content": "Some words here",
        "categoryId": category.id,
        "tagIds": [tag_id],
        "status": "PUBLISHED"
    })
    .to_string();
    let resp = call(&mut app, json_request("POST", "/api/v1/posts", Some(&token), &body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Post = body_json(resp).await;
    assert_eq!(created.category.name, "Rust");
    assert_eq!(created.category.post_count, 1);
    assert_eq!(created.tags[0].name, "async");
    assert_eq!(created.reading_time, 1);
    let id = created.id.clone();

    // filters
    let uri = format!("/api/v1/posts?categoryId={}", category.id);
    let resp = call(&mut app, empty_request("GET", &uri, None)).await;
    let posts: Vec<Post> = body_json(resp).await;
    assert_eq!(posts.len(), 1);
    let resp = call(&mut app, empty_request("GET", "/api/v1/posts?tagId=other", None)).await;
    let posts: Vec<Post> = body_json(resp).await;
    assert!(posts.is_empty());

    // category in use cannot be deleted
    let uri = format!("/api/v1/categories/{}", category.id);
    let resp = call(&mut app, empty_request("DELETE", &uri, Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // update
    let body = serde_json::json!({
        "id": id,
        "title": "Hello again",
        "content": "Some words here",
        "categoryId": category.id,
        "tagIds": [],
        "status": "DRAFT"
    })
    .to_string();
    let uri = format!("/api/v1/posts/{id}");
    let resp = call(&mut app, json_request("PUT", &uri, Some(&token), &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Post = body_json(resp).await;
    assert_eq!(updated.title, "Hello again");
    assert!(updated.tags.is_empty());
    assert_eq!(updated.created_at, created.created_at);

    // delete
    let resp = call(&mut app, empty_request("DELETE", &uri, Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete
    let resp = call(&mut app, empty_request("GET", &uri, None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // category is free again
    let uri = format!("/api/v1/categories/{}", category.id);
    let resp = call(&mut app, empty_request("DELETE", &uri, Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
