#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use portfolio_api::auth::jwt::{generate_access_token, JwtConfig};
use portfolio_api::cache::ViewCache;
use portfolio_api::config::{LogFormat, ServerConfig, StoreBackend};
use portfolio_api::router::build_app_router;
use portfolio_api::services::audit::AuditRecorder;
use portfolio_api::state::AppState;
use portfolio_core::roles::Role;
use portfolio_db::models::user::{CreateUser, User};
use portfolio_db::{InMemoryStore, PortfolioStore, SharedStore};
use portfolio_events::EventBus;

/// Build a test `ServerConfig` with safe defaults and the in-memory store.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        store_backend: StoreBackend::Memory,
        database_url: None,
        db_max_connections: 5,
        db_acquire_timeout_secs: 5,
        log_format: LogFormat::Pretty,
        view_cache_ttl_secs: 60,
        bootstrap_admin_email: None,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// The full router over a fresh in-memory store, plus handles for poking at
/// the store and state directly.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
}

/// Build the application with the same middleware stack `main.rs` uses.
///
/// Must be called inside a Tokio runtime: the audit writer is spawned here.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(InMemoryStore::new());
    let shared: SharedStore = store.clone();
    let (audit, _writer) = AuditRecorder::spawn(Arc::clone(&shared));

    let state = AppState {
        store: shared,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
        audit,
        view_cache: Arc::new(ViewCache::new(Duration::from_secs(config.view_cache_ttl_secs))),
    };
    let router = build_app_router(state.clone(), &config);

    TestApp {
        router,
        state,
        store,
    }
}

impl TestApp {
    /// Create an active user with `role` and return it with a bearer token.
    pub async fn user(&self, role: Role) -> (User, String) {
        let user = self
            .store
            .create_user(&CreateUser {
                email: format!("{}-{}@example.com", role.as_str().to_lowercase(), Uuid::new_v4()),
                full_name: format!("Test {}", role.label()),
                role,
                department: None,
            })
            .await
            .expect("user creation should succeed");
        let token = generate_access_token(user.id, &self.state.config.jwt)
            .expect("token generation should succeed");
        (user, token)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: serde_json::Value) -> Response {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: serde_json::Value) -> Response {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: serde_json::Value) -> Response {
        self.send(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(Method::DELETE, uri, token, None).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Create a project through the API as the holder of `token`.
    pub async fn create_project(&self, token: &str, body: serde_json::Value) -> serde_json::Value {
        let response = self.post("/api/v1/projects", Some(token), body).await;
        assert_eq!(response.status(), axum::http::StatusCode::CREATED);
        body_json(response).await["data"].clone()
    }
}

/// A project body whose schedule lies far in the future, so neither the
/// schedule nor the budget component contributes to its score.
pub fn future_project(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "start_date": "2100-01-01",
        "planned_end_date": "2100-12-31",
    })
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Whether `value` is an object carrying `key`, even with a null value.
pub fn has_key(value: &serde_json::Value, key: &str) -> bool {
    value.as_object().is_some_and(|m| m.contains_key(key))
}
