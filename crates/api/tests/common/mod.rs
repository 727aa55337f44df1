#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use bizhub_api::auth::jwt::SigningKey;
use bizhub_api::auth::password::hash_password;
use bizhub_api::auth::SessionLifecycleManager;
use bizhub_api::config::{AuthConfig, ServerConfig};
use bizhub_api::router::build_app_router;
use bizhub_api::state::AppState;
use bizhub_db::models::user::User;
use bizhub_db::store::{MemorySessionStore, MemoryUserDirectory};

/// Plaintext password of every user created by [`TestApp::create_user`].
pub const TEST_PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout and a fresh random signing key.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        auth: AuthConfig::with_key(SigningKey::generate()),
    }
}

/// The application router plus handles on its in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub auth: Arc<SessionLifecycleManager>,
    pub users: Arc<MemoryUserDirectory>,
    pub sessions: Arc<MemorySessionStore>,
}

impl TestApp {
    /// A clone of the router, ready for one `oneshot` request.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Insert an active user whose password is [`TEST_PASSWORD`].
    pub async fn create_user(&self, email: &str) -> User {
        let hashed = hash_password(TEST_PASSWORD).expect("hashing should succeed");
        self.users.insert(email, &hashed).await
    }

    /// Log in through the API and return the bearer token.
    pub async fn login(&self, email: &str) -> String {
        let body = serde_json::json!({ "email": email, "password": TEST_PASSWORD });
        let response = post_json(self.app(), "/api/v1/auth/login", body).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        json["token"]
            .as_str()
            .expect("login response must contain token")
            .to_string()
    }
}

/// Build the full application router over in-memory stores.
///
/// Uses the same [`build_app_router`] as `main.rs`, so integration tests
/// exercise the production middleware stack (CORS, request ID, timeout,
/// tracing, panic recovery).
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let users = Arc::new(MemoryUserDirectory::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let auth = Arc::new(SessionLifecycleManager::new(
        users.clone(),
        sessions.clone(),
        &config.auth,
    ));

    let state = AppState {
        pool: None,
        config: Arc::new(config.clone()),
        auth: Arc::clone(&auth),
    };

    TestApp {
        router: build_app_router(state, &config),
        auth,
        users,
        sessions,
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

/// Send a GET request without authentication.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a GET request with `Authorization: Bearer <token>`.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body and a bearer token.
pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a body-less POST request with a bearer token.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}
