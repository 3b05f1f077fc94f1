//! Async facade over the blog API.
//!
//! # Design
//! `BlogClient` runs every call through the same pipeline:
//! `BlogRequests::build_*` → [`BearerAuth`] → [`Transport`] →
//! [`UnauthorizedGuard`] → `BlogRequests::parse_*`. The transport, credential
//! store and navigator are injected, so there is no global state. An
//! application builds one client at startup and shares it (clones are cheap
//! and share the same collaborators).
//!
//! Concurrent calls are independent: nothing orders, deduplicates or retries
//! them, and there is no cancellation beyond dropping the future.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::credentials::{CredentialStore, MemoryStore, TOKEN_KEY};
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::interceptors::{BearerAuth, UnauthorizedGuard};
use crate::navigation::{LogNavigator, Navigator};
use crate::requests::BlogRequests;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    AuthResponse, Category, CreatePostRequest, LoginRequest, Post, PostFilter, Tag,
    UpdatePostRequest,
};

#[derive(Clone)]
pub struct BlogClient {
    requests: BlogRequests,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    auth: BearerAuth,
    guard: UnauthorizedGuard,
}

impl BlogClient {
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            requests: BlogRequests::new(&config.base_url),
            transport,
            auth: BearerAuth::new(store.clone()),
            guard: UnauthorizedGuard::new(store.clone(), navigator),
            store,
        }
    }

    pub fn builder(config: ClientConfig) -> BlogClientBuilder {
        BlogClientBuilder::new(config)
    }

    pub fn requests(&self) -> &BlogRequests {
        &self.requests
    }

    async fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        self.auth.apply(&mut request).await?;
        let method = request.method;
        let path = request.path.clone();
        tracing::debug!(%method, %path, "sending request");

        let outcome = self.transport.send(request).await;
        let response = self.guard.inspect(outcome).await.inspect_err(|err| {
            tracing::debug!(%method, %path, status = err.status, "request failed");
        })?;

        tracing::debug!(%method, %path, status = response.status, "request succeeded");
        Ok(response)
    }

    // -- auth -------------------------------------------------------------

    /// Log in and store the returned token as the active credential.
    pub async fn login(&self, input: &LoginRequest) -> Result<AuthResponse> {
        let request = self.requests.build_login(input)?;
        let auth = self.requests.parse_login(self.execute(request).await?)?;
        self.store.set(TOKEN_KEY, &auth.token).await?;
        tracing::info!(expires_in = auth.expires_in, "logged in");
        Ok(auth)
    }

    /// Forget the active credential. Purely local.
    pub async fn logout(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY).await?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Whether a credential is currently stored. Says nothing about whether
    /// the backend still accepts it.
    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.store.get(TOKEN_KEY).await?.is_some())
    }

    // -- categories -------------------------------------------------------

    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        let request = self.requests.build_get_categories();
        self.requests.parse_get_categories(self.execute(request).await?)
    }

    pub async fn create_category(&self, name: &str) -> Result<Category> {
        let request = self.requests.build_create_category(name)?;
        self.requests.parse_create_category(self.execute(request).await?)
    }

    pub async fn update_category(&self, id: &str, name: &str) -> Result<Category> {
        let request = self.requests.build_update_category(id, name)?;
        self.requests.parse_update_category(self.execute(request).await?)
    }

    pub async fn delete_category(&self, id: &str) -> Result<()> {
        let request = self.requests.build_delete_category(id);
        self.requests.parse_delete_category(self.execute(request).await?)
    }

    // -- tags -------------------------------------------------------------

    pub async fn get_tags(&self) -> Result<Vec<Tag>> {
        let request = self.requests.build_get_tags();
        self.requests.parse_get_tags(self.execute(request).await?)
    }

    pub async fn create_tags(&self, names: &[String]) -> Result<Vec<Tag>> {
        let request = self.requests.build_create_tags(names)?;
        self.requests.parse_create_tags(self.execute(request).await?)
    }

    pub async fn delete_tag(&self, id: &str) -> Result<()> {
        let request = self.requests.build_delete_tag(id);
        self.requests.parse_delete_tag(self.execute(request).await?)
    }

    // -- posts ------------------------------------------------------------

    pub async fn get_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let request = self.requests.build_get_posts(filter);
        self.requests.parse_get_posts(self.execute(request).await?)
    }

    pub async fn get_post(&self, id: &str) -> Result<Post> {
        let request = self.requests.build_get_post(id);
        self.requests.parse_get_post(self.execute(request).await?)
    }

    pub async fn create_post(&self, input: &CreatePostRequest) -> Result<Post> {
        let request = self.requests.build_create_post(input)?;
        self.requests.parse_create_post(self.execute(request).await?)
    }

    pub async fn update_post(&self, input: &UpdatePostRequest) -> Result<Post> {
        let request = self.requests.build_update_post(input)?;
        self.requests.parse_update_post(self.execute(request).await?)
    }

    pub async fn delete_post(&self, id: &str) -> Result<()> {
        let request = self.requests.build_delete_post(id);
        self.requests.parse_delete_post(self.execute(request).await?)
    }
}

/// Assembles a [`BlogClient`], defaulting to a reqwest transport, an
/// in-memory credential store and a logging navigator.
pub struct BlogClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn CredentialStore>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl BlogClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            store: None,
            navigator: None,
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn build(self) -> BlogClient {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new()));
        let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let navigator = self.navigator.unwrap_or_else(|| Arc::new(LogNavigator));
        BlogClient::new(&self.config, transport, store, navigator)
    }
}
