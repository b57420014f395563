#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Local};
use estatehub::{
    config::Config,
    db::{MemoryStore, Store},
    routes::create_router,
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use tracing_subscriber::filter::LevelFilter;

pub const PASSWORD: &str = "secret123";

pub fn test_config() -> Config {
    Config {
        database_url: None,
        database_max_connections: 1,
        jwt_secret: "integration-test-secret".to_string(),
        jwt_maxage: 60,
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        cookie_secure: false,
        log_level: LevelFilter::OFF,
    }
}

pub fn app() -> Router {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    create_router(Arc::new(AppState::new(store, test_config())))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `name=value` of the auth cookie, ready for a `Cookie` header.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("access_token="))
            .and_then(|value| value.split(';').next())
            .map(str::to_string)
    }

    pub fn raw_set_cookie(&self) -> String {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn signup(app: &Router, username: &str) -> TestResponse {
    send(
        app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": PASSWORD,
        })),
    )
    .await
}

/// Registers and signs in; returns the session cookie and the user id.
pub async fn register_user(app: &Router, username: &str) -> (String, String) {
    let created = signup(app, username).await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);

    let signed_in = send(
        app,
        Method::POST,
        "/api/auth/signin",
        None,
        Some(json!({
            "email": format!("{}@example.com", username),
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(signed_in.status, StatusCode::OK, "{}", signed_in.body);

    let cookie = signed_in.session_cookie().expect("session cookie");
    let user_id = signed_in.body["user"]["_id"]
        .as_str()
        .expect("user id")
        .to_string();
    (cookie, user_id)
}

pub fn rent_listing() -> Value {
    json!({
        "name": "Marina Flat",
        "description": "Two bedroom flat by the water",
        "address": "12 Marina Road Lagos",
        "regularPrice": 1000,
        "discountPrice": 0,
        "bathrooms": 1,
        "bedrooms": 2,
        "furnished": false,
        "parking": false,
        "type": "rent",
        "offer": false,
        "imageUrls": ["https://img.example.com/1.jpg"],
    })
}

pub async fn create_listing(app: &Router, cookie: &str, body: Value) -> TestResponse {
    send(app, Method::POST, "/api/listing/create", Some(cookie), Some(body)).await
}

pub fn days_from_today(days: i64) -> String {
    (Local::now().date_naive() + Duration::days(days)).to_string()
}
