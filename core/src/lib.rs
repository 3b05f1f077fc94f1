//! Async API client core for the blog service.
//!
//! # Overview
//! Typed access to the blog backend's auth, category, tag and post
//! resources. Every request carries the stored bearer token, every 401 logs
//! the user out and redirects to the login route, and every failure reaches
//! the caller as one normalized [`ApiError`].
//!
//! # Design
//! - `BlogRequests` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network.
//! - `BlogClient` drives those through the interceptors and an injected
//!   `Transport`; the credential store and navigator are injected too.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod interceptors;
pub mod navigation;
pub mod requests;
pub mod transport;
pub mod types;

pub use client::{BlogClient, BlogClientBuilder};
pub use config::ClientConfig;
pub use credentials::{CredentialStore, FileStore, MemoryStore, TOKEN_KEY};
pub use error::{ApiError, ClientError, FieldError, Result, StoreError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use interceptors::{BearerAuth, UnauthorizedGuard};
pub use navigation::{ChannelNavigator, LogNavigator, Navigator, LOGIN_ROUTE};
pub use requests::{BlogRequests, API_PREFIX};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    Author, AuthResponse, Category, CreateCategoryRequest, CreatePostRequest, CreateTagsRequest,
    LoginRequest, Post, PostFilter, PostStatus, Tag, UpdateCategoryRequest, UpdatePostRequest,
};
