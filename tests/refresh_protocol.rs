//! End-to-end tests for the session refresh protocol.
//!
//! Spins up a fake Himmel backend on a random port and drives the real
//! reqwest transport against it, cookie store included: an expired session
//! is renewed via POST /auth/refresh (which answers with `Set-Cookie`) and
//! the original request is retried with the new cookie attached.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

use himmel::{ApiError, ClientConfig, HimmelClient};

const SESSION_COOKIE: &str = "himmel_session=ok";

#[derive(Clone)]
struct Backend {
    refresh_calls: Arc<AtomicU32>,
    fiction_calls: Arc<AtomicU32>,
    /// Whether POST /auth/refresh hands out a new session.
    refresh_ok: bool,
}

impl Backend {
    fn new(refresh_ok: bool) -> Self {
        Self {
            refresh_calls: Arc::new(AtomicU32::new(0)),
            fiction_calls: Arc::new(AtomicU32::new(0)),
            refresh_ok,
        }
    }
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|cookies| cookies.contains(SESSION_COOKIE))
        .unwrap_or(false)
}

async fn refresh(State(state): State<Backend>) -> (StatusCode, HeaderMap, Json<Value>) {
    state.refresh_calls.fetch_add(1, Ordering::Relaxed);
    if !state.refresh_ok {
        return (
            StatusCode::UNAUTHORIZED,
            HeaderMap::new(),
            Json(json!({"status":"error","error":{"details":"refresh token expired"}})),
        );
    }
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("himmel_session=ok; Path=/; HttpOnly"),
    );
    (StatusCode::OK, headers, Json(json!({"status":"success"})))
}

async fn signin() -> (StatusCode, HeaderMap, Json<Value>) {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("himmel_session=ok; Path=/; HttpOnly"),
    );
    let body = json!({
        "status": "success",
        "data": {
            "id": 1,
            "email": "lena@example.test",
            "username": "lena",
            "role": "reader"
        }
    });
    (StatusCode::OK, headers, Json(body))
}

async fn fiction(State(state): State<Backend>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    state.fiction_calls.fetch_add(1, Ordering::Relaxed);
    if !has_session(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status":"error","error":{"type":"INVALID_TOKEN"}})),
        );
    }
    let body = json!({
        "status": "success",
        "data": {
            "id": 1,
            "title": "Castle in the Sky",
            "synopsis": "A floating fortress and the girl who fell from it.",
            "author": "aoi",
            "tags": ["adventure"],
            "averageRating": 4.6,
            "ratingCount": 128,
            "chapterCount": 12,
            "bookmarked": false,
            "createdAt": "2025-06-01T00:00:00Z",
            "updatedAt": "2025-08-01T00:00:00Z"
        }
    });
    (StatusCode::OK, Json(body))
}

async fn admin_users() -> (StatusCode, Json<Value>) {
    (StatusCode::FORBIDDEN, Json(json!({"status":"error"})))
}

/// Bind the fake backend to a random port and return its base URL.
async fn start_backend(state: Backend) -> String {
    let app = Router::new()
        .route("/auth/refresh", post(refresh))
        .route("/auth/signin", post(signin))
        .route("/fictions/{id}", get(fiction))
        .route("/admin/users", get(admin_users))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn test_config(base_url: String, dir: &TempDir) -> ClientConfig {
    ClientConfig::new(
        Some(base_url),
        Some(dir.path().to_path_buf()),
        Some("error".to_string()),
    )
}

#[tokio::test]
async fn expired_session_is_refreshed_and_request_retried() {
    let backend = Backend::new(true);
    let base = start_backend(backend.clone()).await;
    let dir = TempDir::new().unwrap();
    let client = HimmelClient::new(&test_config(base, &dir)).unwrap();

    // No session cookie yet: the first attempt fails with INVALID_TOKEN,
    // the refresh sets one, the retry succeeds.
    let fiction = client.fiction(1).await.unwrap();
    assert_eq!(fiction.title, "Castle in the Sky");
    assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 1);
    assert_eq!(backend.fiction_calls.load(Ordering::Relaxed), 2);

    // The renewed cookie is replayed: no further refresh needed.
    client.fiction(1).await.unwrap();
    assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 1);
    assert_eq!(backend.fiction_calls.load(Ordering::Relaxed), 3);
}

#[tokio::test]
async fn stale_persisted_session_is_replaced_by_refresh() {
    let backend = Backend::new(true);
    let base = start_backend(backend.clone()).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(base, &dir);

    // A long-idle CLI comes back with a session line the backend no longer
    // accepts. The refresh must win over the seeded cookie, not lose to it.
    let client = HimmelClient::with_session(&config, "himmel_session=stale").unwrap();

    let fiction = client.fiction(1).await.unwrap();
    assert_eq!(fiction.title, "Castle in the Sky");
    assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 1);
    assert_eq!(backend.fiction_calls.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn rejected_refresh_surfaces_unauthorized() {
    let backend = Backend::new(false);
    let base = start_backend(backend.clone()).await;
    let dir = TempDir::new().unwrap();
    let client = HimmelClient::new(&test_config(base, &dir)).unwrap();

    let err = client.fiction(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    // The original call must not be retried after a failed refresh.
    assert_eq!(backend.fiction_calls.load(Ordering::Relaxed), 1);
    assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn forbidden_fires_hook_without_refresh() {
    let backend = Backend::new(true);
    let base = start_backend(backend.clone()).await;
    let dir = TempDir::new().unwrap();

    let hook_fired = Arc::new(AtomicBool::new(false));
    let flag = hook_fired.clone();
    let client = HimmelClient::new(&test_config(base, &dir))
        .unwrap()
        .on_forbidden(move || flag.store(true, Ordering::Relaxed));

    let err = client.list_users(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden));
    assert!(hook_fired.load(Ordering::Relaxed));
    assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn sign_in_exposes_cookie_line_for_persistence() {
    let backend = Backend::new(true);
    let base = start_backend(backend.clone()).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(base, &dir);
    let client = HimmelClient::new(&config).unwrap();

    let signin = client
        .sign_in(&himmel::api::auth::Credentials {
            email: "lena@example.test".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(signin.account.username, "lena");
    let cookies = signin.cookies.expect("sign-in should set a session cookie");
    assert!(cookies.contains(SESSION_COOKIE));

    // A client seeded with the persisted line needs no refresh at all.
    let seeded = HimmelClient::with_session(&config, &cookies).unwrap();
    seeded.fiction(1).await.unwrap();
    assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 0);
}
