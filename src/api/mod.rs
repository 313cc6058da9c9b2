//! Typed endpoint surface of the Himmel backend.
//!
//! [`HimmelClient`] owns a [`Dispatcher`]; every method here builds a
//! request, sends it through the dispatcher (inheriting the transparent
//! session refresh), and decodes the envelope's `data` field into a typed
//! model. The modules group endpoints the way the backend does: auth,
//! fictions, chapters, comments, tags, admin, premium.

pub mod admin;
pub mod auth;
pub mod chapters;
pub mod comments;
pub mod fictions;
pub mod premium;
pub mod tags;

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::dispatcher::{ApiRequest, ApiResponse, Dispatcher};
use crate::http::transport::{ReqwestTransport, Transport};

/// One page of a paginated listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

pub struct HimmelClient {
    dispatcher: Dispatcher,
    base: String,
}

impl HimmelClient {
    /// Client with a fresh in-memory cookie store. Sign in to get a session.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::build(config, None)
    }

    /// Client seeded with a persisted session cookie line
    /// (see [`crate::http::cookie_line`]).
    pub fn with_session(config: &ClientConfig, cookies: &str) -> Result<Self, ApiError> {
        Self::build(config, Some(cookies))
    }

    fn build(config: &ClientConfig, cookies: Option<&str>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(
            Duration::from_secs(config.timeout_secs),
            cookies,
            &config.api_base_url,
        )
        .map_err(ApiError::Network)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Client over a caller-supplied transport. Test seam, also useful for
    /// embedders that need custom connection handling.
    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let dispatcher = Dispatcher::new(
            transport,
            config.refresh_url(),
            config.max_auth_retries,
        );
        Self {
            dispatcher,
            base: config.api_base_url.clone(),
        }
    }

    /// Install a side effect to run when a request comes back 403.
    pub fn on_forbidden(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.dispatcher = self.dispatcher.with_forbidden_hook(Arc::new(hook));
        self
    }

    /// Send a raw request through the dispatcher. The typed methods are
    /// usually what you want.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.dispatcher.send(request).await
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}
