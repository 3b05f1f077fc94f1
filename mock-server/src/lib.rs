use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_PREFIX: &str = "/api/v1";

pub const DEMO_EMAIL: &str = "user@test.com";
pub const DEMO_PASSWORD: &str = "password";
pub const TOKEN_TTL_SECS: u64 = 86_400;

const WORDS_PER_MINUTE: usize = 200;

// --- wire types ---

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub post_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub post_count: u64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    Draft,
    Published,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub category: Category,
    pub tags: Vec<Tag>,
    pub reading_time: u32,
    pub created_at: String,
    pub updated_at: String,
    pub status: PostStatus,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: u64,
}

#[derive(Deserialize)]
pub struct CategoryInput {
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateTags {
    pub names: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub category_id: String,
    pub tag_ids: Vec<String>,
    pub status: PostStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostQuery {
    pub category_id: Option<String>,
    pub tag_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error body returned for every failure.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: String,
    errors: Option<Vec<FieldError>>,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    fn invalid(field: &str, message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Validation failed".to_string(),
            errors: Some(vec![FieldError {
                field: field.to_string(),
                message: message.to_string(),
            }]),
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.status.as_u16(),
            message: self.message,
            errors: self.errors,
        };
        (self.status, Json(body)).into_response()
    }
}

// --- storage ---

struct CategoryRow {
    name: String,
}

struct TagRow {
    name: String,
}

struct PostRow {
    seq: u64,
    title: String,
    content: String,
    category_id: String,
    tag_ids: Vec<String>,
    status: PostStatus,
    created_at: String,
    updated_at: String,
}

#[derive(Default)]
pub struct Store {
    categories: HashMap<String, CategoryRow>,
    tags: HashMap<String, TagRow>,
    posts: HashMap<String, PostRow>,
    tokens: HashSet<String>,
    next_seq: u64,
}

pub type Db = Arc<RwLock<Store>>;

fn demo_author() -> Author {
    Author {
        id: "demo-user".to_string(),
        name: "Demo User".to_string(),
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn reading_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

impl Store {
    fn category_view(&self, id: &str, row: &CategoryRow) -> Category {
        let post_count = self.posts.values().filter(|p| p.category_id == id).count();
        Category {
            id: id.to_string(),
            name: row.name.clone(),
            post_count: post_count as u64,
        }
    }

    fn tag_view(&self, id: &str, row: &TagRow) -> Tag {
        let post_count = self
            .posts
            .values()
            .filter(|p| p.tag_ids.iter().any(|t| t == id))
            .count();
        Tag {
            id: id.to_string(),
            name: row.name.clone(),
            post_count: post_count as u64,
        }
    }

    fn post_view(&self, id: &str, row: &PostRow) -> Option<Post> {
        let category = self
            .categories
            .get(&row.category_id)
            .map(|c| self.category_view(&row.category_id, c))?;
        let tags = row
            .tag_ids
            .iter()
            .filter_map(|t| self.tags.get(t).map(|r| self.tag_view(t, r)))
            .collect();
        Some(Post {
            id: id.to_string(),
            title: row.title.clone(),
            content: row.content.clone(),
            author: demo_author(),
            category,
            tags,
            reading_time: reading_time(&row.content),
            created_at: row.created_at.clone(),
            updated_at: row.updated_at.clone(),
            status: row.status,
        })
    }

    fn name_taken(&self, name: &str, except: Option<&str>) -> bool {
        self.categories
            .iter()
            .any(|(id, c)| Some(id.as_str()) != except && c.name.eq_ignore_ascii_case(name))
    }

    fn check_post_input(&self, input: &PostInput) -> Result<(), Failure> {
        if input.title.trim().is_empty() {
            return Err(Failure::invalid("title", "must not be blank"));
        }
        if input.content.trim().is_empty() {
            return Err(Failure::invalid("content", "must not be blank"));
        }
        if !self.categories.contains_key(&input.category_id) {
            return Err(Failure::invalid("categoryId", "unknown category"));
        }
        if let Some(missing) = input.tag_ids.iter().find(|t| !self.tags.contains_key(*t)) {
            return Err(Failure::invalid("tagIds", &format!("unknown tag {missing}")));
        }
        Ok(())
    }
}

fn require_auth(store: &Store, headers: &HeaderMap) -> Result<(), Failure> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(Failure::unauthorized)?;
    if store.tokens.contains(token) {
        Ok(())
    } else {
        Err(Failure::new(StatusCode::UNAUTHORIZED, "Invalid or expired token"))
    }
}

// --- router ---

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/{id}", put(update_category).delete(delete_category))
        .route("/tags", get(list_tags).post(create_tags))
        .route("/tags/{id}", delete(delete_tag))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", get(get_post).put(update_post).delete(delete_post))
        .with_state(db);
    Router::new().nest(API_PREFIX, api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, Failure> {
    if input.email != DEMO_EMAIL || input.password != DEMO_PASSWORD {
        tracing::info!(email = %input.email, "rejected login");
        return Err(Failure::new(
            StatusCode::UNAUTHORIZED,
            "Incorrect email or password",
        ));
    }
    let token = Uuid::new_v4().simple().to_string();
    db.write().await.tokens.insert(token.clone());
    Ok(Json(AuthResponse {
        token,
        expires_in: TOKEN_TTL_SECS,
    }))
}

async fn list_categories(State(db): State<Db>) -> Json<Vec<Category>> {
    let store = db.read().await;
    let mut categories: Vec<Category> = store
        .categories
        .iter()
        .map(|(id, row)| store.category_view(id, row))
        .collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    Json(categories)
}

async fn create_category(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>), Failure> {
    let mut store = db.write().await;
    require_auth(&store, &headers)?;
    let name = input.name.trim();
    if name.is_empty() {
        return Err(Failure::invalid("name", "must not be blank"));
    }
    if store.name_taken(name, None) {
        return Err(Failure::new(
            StatusCode::CONFLICT,
            format!("Category '{name}' already exists"),
        ));
    }
    let id = Uuid::new_v4().to_string();
    let row = CategoryRow {
        name: name.to_string(),
    };
    let view = store.category_view(&id, &row);
    store.categories.insert(id, row);
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_category(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>, Failure> {
    let mut store = db.write().await;
    require_auth(&store, &headers)?;
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Failure::invalid("name", "must not be blank"));
    }
    if !store.categories.contains_key(&id) {
        return Err(Failure::not_found("Category"));
    }
    if store.name_taken(&name, Some(&id)) {
        return Err(Failure::new(
            StatusCode::CONFLICT,
            format!("Category '{name}' already exists"),
        ));
    }
    let row = CategoryRow { name };
    let view = store.category_view(&id, &row);
    store.categories.insert(id, row);
    Ok(Json(view))
}

async fn delete_category(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    require_auth(&store, &headers)?;
    if !store.categories.contains_key(&id) {
        return Err(Failure::not_found("Category"));
    }
    if store.posts.values().any(|p| p.category_id == id) {
        return Err(Failure::new(
            StatusCode::CONFLICT,
            "Category has posts associated with it",
        ));
    }
    store.categories.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tags(State(db): State<Db>) -> Json<Vec<Tag>> {
    let store = db.read().await;
    let mut tags: Vec<Tag> = store
        .tags
        .iter()
        .map(|(id, row)| store.tag_view(id, row))
        .collect();
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    Json(tags)
}

/// Existing tags are reused by name; the response lists one tag per
/// requested name, in request order.
async fn create_tags(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateTags>,
) -> Result<(StatusCode, Json<Vec<Tag>>), Failure> {
    let mut store = db.write().await;
    require_auth(&store, &headers)?;
    if input.names.iter().any(|n| n.trim().is_empty()) {
        return Err(Failure::invalid("names", "must not contain blank names"));
    }
    let mut ids = Vec::with_capacity(input.names.len());
    for name in &input.names {
        let name = name.trim();
        let existing = store
            .tags
            .iter()
            .find(|(_, t)| t.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| id.clone());
        let id = match existing {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                store.tags.insert(
                    id.clone(),
                    TagRow {
                        name: name.to_string(),
                    },
                );
                id
            }
        };
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    let tags = ids
        .iter()
        .filter_map(|id| store.tags.get(id).map(|row| store.tag_view(id, row)))
        .collect();
    Ok((StatusCode::CREATED, Json(tags)))
}

async fn delete_tag(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    require_auth(&store, &headers)?;
    if !store.tags.contains_key(&id) {
        return Err(Failure::not_found("Tag"));
    }
    if store.posts.values().any(|p| p.tag_ids.contains(&id)) {
        return Err(Failure::new(
            StatusCode::CONFLICT,
            "Tag has posts associated with it",
        ));
    }
    store.tags.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_posts(State(db): State<Db>, Query(query): Query<PostQuery>) -> Json<Vec<Post>> {
    let store = db.read().await;
    let mut rows: Vec<(&String, &PostRow)> = store
        .posts
        .iter()
        .filter(|(_, p)| query.category_id.as_ref().is_none_or(|c| &p.category_id == c))
        .filter(|(_, p)| query.tag_id.as_ref().is_none_or(|t| p.tag_ids.contains(t)))
        .collect();
    rows.sort_by_key(|(_, p)| p.seq);
    Json(
        rows.into_iter()
            .filter_map(|(id, row)| store.post_view(id, row))
            .collect(),
    )
}

async fn get_post(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Post>, Failure> {
    let store = db.read().await;
    store
        .posts
        .get(&id)
        .and_then(|row| store.post_view(&id, row))
        .map(Json)
        .ok_or_else(|| Failure::not_found("Post"))
}

async fn create_post(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<PostInput>,
) -> Result<(StatusCode, Json<Post>), Failure> {
    let mut store = db.write().await;
    require_auth(&store, &headers)?;
    store.check_post_input(&input)?;
    let id = Uuid::new_v4().to_string();
    let timestamp = now();
    store.next_seq += 1;
    let row = PostRow {
        seq: store.next_seq,
        title: input.title,
        content: input.content,
        category_id: input.category_id,
        tag_ids: input.tag_ids,
        status: input.status,
        created_at: timestamp.clone(),
        updated_at: timestamp,
    };
    store.posts.insert(id.clone(), row);
    let view = store
        .posts
        .get(&id)
        .and_then(|row| store.post_view(&id, row))
        .ok_or_else(|| Failure::not_found("Post"))?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_post(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<PostInput>,
) -> Result<Json<Post>, Failure> {
    let mut store = db.write().await;
    require_auth(&store, &headers)?;
    let (seq, created_at) = store
        .posts
        .get(&id)
        .map(|p| (p.seq, p.created_at.clone()))
        .ok_or_else(|| Failure::not_found("Post"))?;
    store.check_post_input(&input)?;
    let row = PostRow {
        seq,
        title: input.title,
        content: input.content,
        category_id: input.category_id,
        tag_ids: input.tag_ids,
        status: input.status,
        created_at,
        updated_at: now(),
    };
    store.posts.insert(id.clone(), row);
    let view = store
        .posts
        .get(&id)
        .and_then(|row| store.post_view(&id, row))
        .ok_or_else(|| Failure::not_found("Post"))?;
    Ok(Json(view))
}

async fn delete_post(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    require_auth(&store, &headers)?;
    store
        .posts
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| Failure::not_found("Post"))
}
