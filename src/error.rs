//! Error taxonomy for API calls.
//!
//! Every terminal outcome of a dispatched request maps to exactly one
//! variant. Recoverable auth failures (`INVALID_TOKEN`, `NO_TOKEN_PROVIDED`)
//! never appear here: the dispatcher resolves them internally via the
//! refresh coordinator and only escalates to [`ApiError::Unauthorized`]
//! when refresh itself fails or the retry budget runs out.

use crate::http::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP 403. The caller has no rights to the resource; must not be retried.
    #[error("forbidden")]
    Forbidden,

    /// The session could not be renewed. The user has to sign in again.
    #[error("{message}")]
    Unauthorized { message: String },

    /// Any other non-2xx response. `message` comes from the envelope's
    /// `error.details`, falling back to `error.message`, then a generic text.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// Transport-level failure (DNS, TLS, connect, body read).
    #[error(transparent)]
    Network(#[from] TransportError),

    /// The response body did not decode into the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub(crate) fn unauthorized() -> Self {
        Self::Unauthorized {
            message: "unauthorized, please sign in again".to_string(),
        }
    }
}
