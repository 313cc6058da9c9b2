// SPDX-License-Identifier: MIT
//! Session refresh coordinator.
//!
//! When the dispatcher classifies a response as a recoverable auth failure,
//! it asks this coordinator to renew the session via POST /auth/refresh.
//! The backend answers a successful refresh with a `Set-Cookie` header; the
//! transport's cookie store picks it up, so the coordinator itself persists
//! no token.
//!
//! Concurrent in-flight requests can all hit the expired session at once.
//! Without coordination each would issue its own refresh call. The
//! coordinator de-duplicates them with a generation counter: callers record
//! the generation before dispatching, and a refresh request quoting a stale
//! generation returns immediately because someone else already renewed the
//! session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::Method;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::transport::{Transport, TransportRequest};

pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    refresh_url: String,
    /// Bumped once per successful refresh.
    generation: AtomicU64,
    /// Serializes actual refresh calls; the generation check happens under it.
    guard: Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(transport: Arc<dyn Transport>, refresh_url: String) -> Self {
        Self {
            transport,
            refresh_url,
            generation: AtomicU64::new(0),
            guard: Mutex::new(()),
        }
    }

    /// Current refresh generation. Record this before dispatching a request.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Renew the session, unless another caller already did so since
    /// `observed_generation` was recorded.
    ///
    /// Terminal failure (non-2xx from the refresh endpoint) means the session
    /// is gone for good: the caller must surface an unauthorized error and
    /// must not retry the original request.
    pub async fn refresh(&self, observed_generation: u64) -> Result<(), ApiError> {
        let _guard = self.guard.lock().await;

        if self.generation.load(Ordering::Acquire) != observed_generation {
            debug!("session already refreshed by a concurrent call");
            return Ok(());
        }

        let request = TransportRequest::new(Method::POST, self.refresh_url.clone());
        let resp = self.transport.send(request).await?;

        if resp.status.is_success() {
            self.generation.fetch_add(1, Ordering::AcqRel);
            debug!("session refreshed");
            Ok(())
        } else {
            warn!(status = resp.status.as_u16(), "session refresh rejected");
            Err(ApiError::unauthorized())
        }
    }
}
