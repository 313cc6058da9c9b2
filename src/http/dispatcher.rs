// SPDX-License-Identifier: MIT
//! Request dispatcher: one HTTP call with transparent session refresh.
//!
//! Every API call goes through [`Dispatcher::send`], which classifies the
//! response and resolves recoverable auth failures by refreshing the session
//! and retrying the original request.
//!
//! # State machine (per logical call)
//!
//! ```text
//! START ──► DISPATCH
//! DISPATCH ──2xx──────────────► SUCCESS (terminal)
//! DISPATCH ──403──────────────► forbidden hook, FAIL (terminal)
//! DISPATCH ──auth expired─────► REFRESH
//! DISPATCH ──other error──────► FAIL (terminal)
//! REFRESH ──rejected──────────► FAIL (terminal, unauthorized)
//! REFRESH ──renewed───────────► DISPATCH (bounded by max_auth_retries)
//! ```
//!
//! The retry loop is iterative and bounded: a backend that keeps answering
//! `INVALID_TOKEN` after successful refreshes exhausts the budget and the
//! call fails with an unauthorized error instead of looping forever.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::envelope::{classify, Envelope, Outcome};
use crate::error::ApiError;
use crate::http::transport::{Transport, TransportRequest, TransportResponse};
use crate::session::RefreshCoordinator;

/// Side effect to run exactly once when a request comes back 403.
/// The web embedder navigates away; the CLI prints a notice; default no-op.
pub type ForbiddenHook = Arc<dyn Fn() + Send + Sync>;

// ─── Request / response types ─────────────────────────────────────────────────

/// One API request. Cheap to clone so the dispatcher can re-issue it after
/// a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

impl From<ApiRequest> for TransportRequest {
    fn from(req: ApiRequest) -> Self {
        Self {
            method: req.method,
            url: req.url,
            body: req.body,
        }
    }
}

/// A successful response, preserving status, headers, and raw body so
/// callers keep the usual fetch-then-decode idiom.
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Decode the whole body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decode the envelope's `data` field.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let envelope: Envelope = serde_json::from_slice(&self.body)?;
        let data = envelope.data.unwrap_or(Value::Null);
        Ok(serde_json::from_value(data)?)
    }
}

impl From<TransportResponse> for ApiResponse {
    fn from(resp: TransportResponse) -> Self {
        Self {
            status: resp.status,
            headers: resp.headers,
            body: resp.body,
        }
    }
}

// ─── Dispatcher ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    refresh: Arc<RefreshCoordinator>,
    /// How many refresh-and-retry cycles one logical call may spend.
    /// 0 disables the refresh protocol entirely.
    max_auth_retries: u32,
    on_forbidden: ForbiddenHook,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, refresh_url: String, max_auth_retries: u32) -> Self {
        let refresh = Arc::new(RefreshCoordinator::new(transport.clone(), refresh_url));
        Self {
            transport,
            refresh,
            max_auth_retries,
            on_forbidden: Arc::new(|| {}),
        }
    }

    /// Replace the 403 side effect.
    pub fn with_forbidden_hook(mut self, hook: ForbiddenHook) -> Self {
        self.on_forbidden = hook;
        self
    }

    /// Issue `request`, transparently refreshing the session on recoverable
    /// auth failures. Terminal outcomes map onto [`ApiError`]; recoverable
    /// ones never escape this function.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut retries_left = self.max_auth_retries;

        loop {
            // Observed before dispatch: if a concurrent call refreshes the
            // session while ours is in flight, our refresh request below is
            // recognized as stale and skipped.
            let generation = self.refresh.generation();

            debug!(method = %request.method, url = %request.url, "dispatching request");
            let resp = match self.transport.send(request.clone().into()).await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(url = %request.url, err = %e, "transport error");
                    return Err(e.into());
                }
            };

            match classify(resp.status, &resp.body) {
                Outcome::Success => return Ok(resp.into()),
                Outcome::Forbidden => {
                    warn!(url = %request.url, "forbidden");
                    (self.on_forbidden)();
                    return Err(ApiError::Forbidden);
                }
                Outcome::AuthExpired(reason) => {
                    if retries_left == 0 {
                        warn!(
                            url = %request.url,
                            reason = reason.as_wire(),
                            "auth retry budget exhausted"
                        );
                        return Err(ApiError::unauthorized());
                    }
                    retries_left -= 1;
                    debug!(
                        url = %request.url,
                        reason = reason.as_wire(),
                        retries_left,
                        "session expired, refreshing"
                    );
                    self.refresh.refresh(generation).await?;
                }
                Outcome::Failed { status, message } => {
                    warn!(url = %request.url, status, %message, "request failed");
                    return Err(ApiError::Request { status, message });
                }
            }
        }
    }
}
