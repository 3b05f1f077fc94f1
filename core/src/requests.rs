//! Stateless HTTP request builder and response parser for the blog API.
//!
//! # Design
//! `BlogRequests` holds only the API root and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. [`crate::BlogClient`] drives both halves over a transport;
//! callers that do their own I/O can use this type directly.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, ClientError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AuthResponse, Category, CreateCategoryRequest, CreatePostRequest, CreateTagsRequest,
    LoginRequest, Post, PostFilter, Tag, UpdateCategoryRequest, UpdatePostRequest,
};

/// Versioned prefix every resource path hangs off.
pub const API_PREFIX: &str = "/api/v1";

const JSON: &str = "application/json";

/// Request builder and response parser bound to one API root.
#[derive(Debug, Clone)]
pub struct BlogRequests {
    api_root: String,
}

impl BlogRequests {
    /// `base_url` is the server origin; [`API_PREFIX`] is appended.
    pub fn new(base_url: &str) -> Self {
        Self {
            api_root: format!("{}{API_PREFIX}", base_url.trim_end_matches('/')),
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    // -- auth -------------------------------------------------------------

    pub fn build_login(&self, input: &LoginRequest) -> Result<HttpRequest> {
        self.with_body(HttpMethod::Post, "/auth/login".to_string(), input)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<AuthResponse> {
        parse_json(response)
    }

    // -- categories -------------------------------------------------------

    pub fn build_get_categories(&self) -> HttpRequest {
        self.without_body(HttpMethod::Get, "/categories".to_string())
    }

    pub fn parse_get_categories(&self, response: HttpResponse) -> Result<Vec<Category>> {
        parse_json(response)
    }

    pub fn build_create_category(&self, name: &str) -> Result<HttpRequest> {
        let input = CreateCategoryRequest {
            name: name.to_string(),
        };
        self.with_body(HttpMethod::Post, "/categories".to_string(), &input)
    }

    pub fn parse_create_category(&self, response: HttpResponse) -> Result<Category> {
        parse_json(response)
    }

    pub fn build_update_category(&self, id: &str, name: &str) -> Result<HttpRequest> {
        let input = UpdateCategoryRequest {
            id: id.to_string(),
            name: name.to_string(),
        };
        self.with_body(HttpMethod::Put, resource_path("/categories", id), &input)
    }

    pub fn parse_update_category(&self, response: HttpResponse) -> Result<Category> {
        parse_json(response)
    }

    pub fn build_delete_category(&self, id: &str) -> HttpRequest {
        self.without_body(HttpMethod::Delete, resource_path("/categories", id))
    }

    pub fn parse_delete_category(&self, response: HttpResponse) -> Result<()> {
        parse_empty(response)
    }

    // -- tags -------------------------------------------------------------

    pub fn build_get_tags(&self) -> HttpRequest {
        self.without_body(HttpMethod::Get, "/tags".to_string())
    }

    pub fn parse_get_tags(&self, response: HttpResponse) -> Result<Vec<Tag>> {
        parse_json(response)
    }

    pub fn build_create_tags(&self, names: &[String]) -> Result<HttpRequest> {
        let input = CreateTagsRequest {
            names: names.to_vec(),
        };
        self.with_body(HttpMethod::Post, "/tags".to_string(), &input)
    }

    pub fn parse_create_tags(&self, response: HttpResponse) -> Result<Vec<Tag>> {
        parse_json(response)
    }

    pub fn build_delete_tag(&self, id: &str) -> HttpRequest {
        self.without_body(HttpMethod::Delete, resource_path("/tags", id))
    }

    pub fn parse_delete_tag(&self, response: HttpResponse) -> Result<()> {
        parse_empty(response)
    }

    // -- posts ------------------------------------------------------------

    pub fn build_get_posts(&self, filter: &PostFilter) -> HttpRequest {
        let mut query = Vec::new();
        if let Some(category_id) = &filter.category_id {
            query.push(format!("categoryId={}", urlencoding::encode(category_id)));
        }
        if let Some(tag_id) = &filter.tag_id {
            query.push(format!("tagId={}", urlencoding::encode(tag_id)));
        }
        let path = if query.is_empty() {
            "/posts".to_string()
        } else {
            format!("/posts?{}", query.join("&"))
        };
        self.without_body(HttpMethod::Get, path)
    }

    pub fn parse_get_posts(&self, response: HttpResponse) -> Result<Vec<Post>> {
        parse_json(response)
    }

    pub fn build_get_post(&self, id: &str) -> HttpRequest {
        self.without_body(HttpMethod::Get, resource_path("/posts", id))
    }

    pub fn parse_get_post(&self, response: HttpResponse) -> Result<Post> {
        parse_json(response)
    }

    pub fn build_create_post(&self, input: &CreatePostRequest) -> Result<HttpRequest> {
        self.with_body(HttpMethod::Post, "/posts".to_string(), input)
    }

    pub fn parse_create_post(&self, response: HttpResponse) -> Result<Post> {
        parse_json(response)
    }

    pub fn build_update_post(&self, input: &UpdatePostRequest) -> Result<HttpRequest> {
        self.with_body(HttpMethod::Put, resource_path("/posts", &input.id), input)
    }

    pub fn parse_update_post(&self, response: HttpResponse) -> Result<Post> {
        parse_json(response)
    }

    pub fn build_delete_post(&self, id: &str) -> HttpRequest {
        self.without_body(HttpMethod::Delete, resource_path("/posts", id))
    }

    pub fn parse_delete_post(&self, response: HttpResponse) -> Result<()> {
        parse_empty(response)
    }

    // -- helpers ----------------------------------------------------------

    fn without_body(&self, method: HttpMethod, path: String) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.api_root),
            headers: vec![("accept".to_string(), JSON.to_string())],
            body: None,
        }
    }

    fn with_body<B: Serialize>(
        &self,
        method: HttpMethod,
        path: String,
        input: &B,
    ) -> Result<HttpRequest> {
        let body = serde_json::to_string(input).map_err(ClientError::Encode)?;
        let mut request = self.without_body(method, path);
        request.set_header("content-type", JSON);
        request.body = Some(body);
        Ok(request)
    }
}

fn resource_path(collection: &str, id: &str) -> String {
    format!("{collection}/{}", urlencoding::encode(id))
}

/// Map a non-2xx response to its normalized `ApiError`.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::from_failure_body(&response.body).into())
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(ClientError::Decode)
}

fn parse_empty(response: HttpResponse) -> Result<()> {
    check_status(&response)
}
