//! Integration tests for the Energy+ API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p energy-plus-integration-tests
//! ```
//!
//! The tests drive the real router in-process with
//! `tower::ServiceExt::oneshot`. Records live in a [`MemoryRecordStore`] and
//! sessions in a `tower_sessions::MemoryStore`, so no database or running
//! server is needed.
//!
//! # Test Categories
//!
//! - `auth` - Registration, login, logout, session handling
//! - `ranking` - Global and friends-scoped leaderboards
//! - `friends` - Friend request workflow
//! - `city` - City and store dashboards, role gates
//! - `errors` - Malformed requests and out-of-range input

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use energy_plus_core::Role;
use energy_plus_server::config::{LogFormat, ServerConfig};
use energy_plus_server::db::{MemoryRecordStore, RecordStore};
use energy_plus_server::middleware::session_layer;
use energy_plus_server::models::User;
use energy_plus_server::services::AuthService;
use energy_plus_server::state::AppState;

/// Password used for every account created by the helpers.
pub const PASSWORD: &str = "123456";

/// Configuration for an in-process server.
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://unused@localhost/energy_test".to_owned()),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 5000,
        base_url: "http://localhost:5000".to_owned(),
        request_timeout: Duration::from_secs(30),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
        log_format: LogFormat::Text,
    }
}

/// An application instance with its own record and session stores.
#[derive(Clone)]
pub struct TestApp {
    router: Router,
    store: Arc<MemoryRecordStore>,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryRecordStore::new());
        let state = AppState::new(config.clone(), store.clone());
        let router = energy_plus_server::app(
            state,
            session_layer(MemoryStore::default(), config.secure_cookies()),
        );
        Self { router, store }
    }

    /// Direct access to the record store for fixtures and assertions.
    #[must_use]
    pub fn store(&self) -> &MemoryRecordStore {
        &self.store
    }

    /// A client with an empty cookie jar.
    #[must_use]
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }

    /// Create a user directly in the store. Works for every role.
    ///
    /// # Panics
    ///
    /// Panics if the user can't be created.
    pub async fn create_user(&self, username: &str, display_name: &str, role: Role) -> User {
        AuthService::new(self.store.as_ref() as &dyn RecordStore)
            .create_user(username, display_name, PASSWORD, role)
            .await
            .unwrap_or_else(|e| panic!("failed to create {username}: {e}"))
    }

    /// Create a user and return a client logged in as them.
    pub async fn login_as(&self, username: &str, display_name: &str, role: Role) -> (User, TestClient) {
        let user = self.create_user(username, display_name, role).await;
        let mut client = self.client();
        let (status, _) = client.login(username, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login as {username}");
        (user, client)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A client that carries the session cookie between requests.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    /// Send a request and decode the JSON response body.
    ///
    /// Non-JSON bodies (such as `/health`) come back as a JSON string.
    ///
    /// # Panics
    ///
    /// Panics if the request can't be built or the body can't be read.
    pub async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = body.map(|json| (json.to_string(), "application/json"));
        self.send_raw(method, uri, body).await
    }

    /// Send a request with a body given verbatim along with its content type.
    ///
    /// # Panics
    ///
    /// Panics if the request can't be built or the body can't be read.
    pub async fn send_raw(
        &mut self,
        method: Method,
        uri: &str,
        body: Option<(String, &str)>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some((text, content_type)) => builder
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(text)),
            None => builder.body(Body::empty()),
        }
        .unwrap_or_else(|e| panic!("invalid request {uri}: {e}"));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .unwrap_or_default()
                .split(';')
                .next()
                .unwrap_or_default()
                .to_owned();
            self.cookie = Some(pair);
        }

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|e| panic!("failed to read body of {uri}: {e}"));
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, None).await
    }

    pub async fn delete(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/api/auth/login",
            json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Record a walk as the logged-in user.
    pub async fn walk(&mut self, distance: f64) -> (StatusCode, Value) {
        self.post(
            "/api/walks",
            json!({ "distance": distance, "duration": 600 }),
        )
        .await
    }
}
