//! Outbound and inbound hooks wrapped around every transport call.
//!
//! # Design
//! `BearerAuth` runs on each request before it is sent; `UnauthorizedGuard`
//! runs on each outcome after the transport returns. Both only see the
//! capabilities they need, so the 401 path can be exercised with an
//! in-memory store and a recording navigator.

use std::sync::Arc;

use crate::credentials::{CredentialStore, TOKEN_KEY};
use crate::error::{ApiError, StoreError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::navigation::{Navigator, LOGIN_ROUTE};

/// Attaches `authorization: Bearer <token>` when a token is stored.
#[derive(Clone)]
pub struct BearerAuth {
    store: Arc<dyn CredentialStore>,
}

impl BearerAuth {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// A failed store read is returned as-is; the request must not be sent.
    pub async fn apply(&self, request: &mut HttpRequest) -> Result<(), StoreError> {
        if let Some(token) = self.store.get(TOKEN_KEY).await? {
            request.set_header("authorization", format!("Bearer {token}"));
        }
        Ok(())
    }
}

/// Turns a transport outcome into either a successful response or exactly
/// one normalized `ApiError`, logging the user out on 401 first.
#[derive(Clone)]
pub struct UnauthorizedGuard {
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
}

impl UnauthorizedGuard {
    pub fn new(store: Arc<dyn CredentialStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    pub async fn inspect(
        &self,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<HttpResponse, ApiError> {
        let response = match outcome {
            Ok(response) if response.is_success() => return Ok(response),
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(error = %err, "no response received");
                return Err(ApiError::unexpected());
            }
        };

        if response.status == 401 {
            tracing::warn!("credential rejected, clearing it and redirecting to login");
            // The redirect must still happen if the store cannot be cleared.
            if let Err(err) = self.store.remove(TOKEN_KEY).await {
                tracing::warn!(error = %err, "failed to clear credential after 401");
            }
            self.navigator.redirect(LOGIN_ROUTE);
        }

        Err(ApiError::from_failure_body(&response.body))
    }
}
