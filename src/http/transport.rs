//! Transport seam between the dispatcher and the network.
//!
//! The dispatcher and refresh coordinator only know the [`Transport`] trait,
//! so tests can script responses without a socket. [`ReqwestTransport`] is
//! the production implementation: one `reqwest::Client` with a cookie store,
//! shared by every call, so a `Set-Cookie` from the refresh endpoint is
//! automatically replayed on the retried request.

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

/// One outbound request, before credentials are attached.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    /// JSON body, if any. The transport sets the content type.
    pub body: Option<Value>,
}

impl TransportRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
        }
    }
}

/// Raw response as seen on the wire: status, headers, undecoded body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Minimal HTTP seam. Implementations must attach session credentials
/// (cookies) to every request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

// ─── Production transport ─────────────────────────────────────────────────────

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with a cookie store and a per-request timeout.
    ///
    /// `initial_cookies` seeds the cookie store for embedders that persist a
    /// session line across processes (see [`crate::http::cookie_line`]). The
    /// seed goes into the jar, scoped to `api_base_url`, never into a fixed
    /// `Cookie` header: a header would shadow the jar on every request, so a
    /// renewed cookie from `/auth/refresh` could never replace a stale seed.
    pub fn new(
        timeout: Duration,
        initial_cookies: Option<&str>,
        api_base_url: &str,
    ) -> Result<Self, TransportError> {
        let jar = Arc::new(Jar::default());

        if let Some(cookies) = initial_cookies {
            let url = Url::parse(api_base_url)
                .map_err(|e| TransportError::Other(format!("invalid API base URL: {e}")))?;
            for cookie in cookies.split(';') {
                let cookie = cookie.trim();
                if !cookie.is_empty() {
                    jar.add_cookie_str(cookie, &url);
                }
            }
        }

        let client = reqwest::Client::builder()
            .cookie_provider(jar)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.request(request.method, &request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
