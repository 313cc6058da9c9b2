//! Response envelope boundary.
//!
//! Every backend response is a JSON wrapper `{status, data, error}`. This
//! module deserializes that wrapper and classifies the combination of HTTP
//! status and body into exactly one [`Outcome`]. Classification is a pure
//! function of its inputs; it holds no state and is safe to re-run.
//!
//! The recognized recoverable auth failures form a closed enumeration
//! ([`AuthFailureReason`]) instead of repeated raw string comparison.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

/// Fallback text when the backend gives us nothing usable.
const GENERIC_FAILURE: &str = "request failed";

// ─── Wire types ───────────────────────────────────────────────────────────────

/// The uniform `{status, data, error}` wrapper used by every endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    /// `"success"` or `"error"`. Absent on malformed bodies.
    pub status: Option<String>,
    /// Endpoint-specific payload; opaque at this layer.
    pub data: Option<Value>,
    pub error: Option<ApiFailure>,
}

/// The `error` object of a failed envelope.
#[derive(Debug, Default, Deserialize)]
pub struct ApiFailure {
    /// Machine-readable failure tag, e.g. `"INVALID_TOKEN"`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Human-readable description of what went wrong.
    pub details: Option<String>,
    /// Some endpoints send a generic message instead of details.
    pub message: Option<String>,
}

// ─── Classification ───────────────────────────────────────────────────────────

/// Why the backend rejected the session. Renewable via the refresh endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureReason {
    InvalidToken,
    NoTokenProvided,
}

impl AuthFailureReason {
    /// Map a wire `error.type` string onto the closed enumeration.
    /// Unknown tags are not auth failures.
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "INVALID_TOKEN" => Some(Self::InvalidToken),
            "NO_TOKEN_PROVIDED" => Some(Self::NoTokenProvided),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::NoTokenProvided => "NO_TOKEN_PROVIDED",
        }
    }
}

/// Discriminated result of classifying one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx with no recognized failure tag. The body is the caller's payload.
    Success,
    /// HTTP 403. Terminal; must never trigger a refresh.
    Forbidden,
    /// The session token is missing or invalid. The dispatcher resolves this
    /// internally; it is never surfaced to callers.
    AuthExpired(AuthFailureReason),
    /// Any other non-2xx response. Terminal.
    Failed { status: u16, message: String },
}

/// Classify one response. Precedence: 403 first, then a recognized
/// `error.type`, then any other non-2xx, else success.
pub fn classify(status: StatusCode, body: &[u8]) -> Outcome {
    if status == StatusCode::FORBIDDEN {
        return Outcome::Forbidden;
    }

    // Tolerate non-JSON bodies: classification then rests on the status alone.
    let envelope: Envelope = serde_json::from_slice(body).unwrap_or_default();

    if let Some(reason) = envelope
        .error
        .as_ref()
        .and_then(|e| e.kind.as_deref())
        .and_then(AuthFailureReason::from_wire)
    {
        return Outcome::AuthExpired(reason);
    }

    if !status.is_success() {
        let message = envelope
            .error
            .and_then(|e| e.details.or(e.message))
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        return Outcome::Failed {
            status: status.as_u16(),
            message,
        };
    }

    Outcome::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn status(code: u16) -> StatusCode {
        StatusCode::from_u16(code).unwrap()
    }

    #[test]
    fn two_xx_is_success() {
        let body = br#"{"status":"success","data":{"id":1}}"#;
        assert_eq!(classify(status(200), body), Outcome::Success);
    }

    #[test]
    fn forbidden_wins_over_auth_tag() {
        // A 403 must short-circuit even if the body carries a recoverable tag.
        let body = br#"{"status":"error","error":{"type":"INVALID_TOKEN"}}"#;
        assert_eq!(classify(status(403), body), Outcome::Forbidden);
    }

    #[test]
    fn auth_tag_wins_even_on_success_status() {
        // A recognized tag takes precedence over the status code: a 200
        // carrying INVALID_TOKEN is still a recoverable auth failure.
        let body = br#"{"status":"error","error":{"type":"INVALID_TOKEN"}}"#;
        assert_eq!(
            classify(status(200), body),
            Outcome::AuthExpired(AuthFailureReason::InvalidToken)
        );
    }

    #[test]
    fn recognized_tags_are_recoverable() {
        let invalid = br#"{"status":"error","error":{"type":"INVALID_TOKEN"}}"#;
        let missing = br#"{"status":"error","error":{"type":"NO_TOKEN_PROVIDED"}}"#;
        assert_eq!(
            classify(status(401), invalid),
            Outcome::AuthExpired(AuthFailureReason::InvalidToken)
        );
        assert_eq!(
            classify(status(401), missing),
            Outcome::AuthExpired(AuthFailureReason::NoTokenProvided)
        );
    }

    #[test]
    fn unknown_tag_uses_details() {
        let body = br#"{"status":"error","error":{"type":"RATE_LIMITED","details":"slow down"}}"#;
        assert_eq!(
            classify(status(429), body),
            Outcome::Failed {
                status: 429,
                message: "slow down".to_string()
            }
        );
    }

    #[test]
    fn message_is_fallback_for_details() {
        let body = br#"{"status":"error","error":{"message":"something broke"}}"#;
        assert_eq!(
            classify(status(500), body),
            Outcome::Failed {
                status: 500,
                message: "something broke".to_string()
            }
        );
    }

    #[test]
    fn malformed_body_falls_back_to_generic() {
        assert_eq!(
            classify(status(502), b"<html>bad gateway</html>"),
            Outcome::Failed {
                status: 502,
                message: GENERIC_FAILURE.to_string()
            }
        );
    }

    proptest! {
        /// Classification is a pure function: re-running it on the same
        /// status + body always yields the same branch.
        #[test]
        fn classification_is_idempotent(code in 200u16..=599, body in ".*") {
            let s = status(code);
            let first = classify(s, body.as_bytes());
            let second = classify(s, body.as_bytes());
            prop_assert_eq!(first, second);
        }
    }
}
