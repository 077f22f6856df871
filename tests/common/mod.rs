#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use outlay::{ServerConfig, create_app, db::Database, jwt::JwtConfig};
use serde_json::{Value, json};
use std::num::NonZeroU32;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &[u8] = b"test-jwt-secret-for-integration-tests";

/// Cheapest bcrypt work factor, keeps the suite fast.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Create a test app over a fresh in-memory database, without login rate limiting.
pub async fn create_test_app() -> (Router, Database) {
    create_test_app_with_rate_limit(None).await
}

pub async fn create_test_app_with_rate_limit(
    login_rate_limit: Option<NonZeroU32>,
) -> (Router, Database) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: TEST_JWT_SECRET.to_vec(),
        bcrypt_cost: TEST_BCRYPT_COST,
        login_rate_limit,
    };
    (create_app(&config), db)
}

/// The JWT config matching the test app's secret.
pub fn test_jwt() -> JwtConfig {
    JwtConfig::new(TEST_JWT_SECRET)
}

/// Send a request through the app and return the status and JSON body
/// (`Value::Null` when the body is empty or not JSON).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Create a user through the API and return the created record.
pub async fn create_user(app: &Router, email: &str, password: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/user/add",
        None,
        Some(json!({
            "email": email,
            "name": "Test User",
            "password": password,
            "level": 1,
            "status": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create user failed: {}", body);
    body
}

/// Log in through the API and return the token.
pub async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

/// Create a user and log in as them. Returns (user record, token).
pub async fn authenticated_user(app: &Router, email: &str) -> (Value, String) {
    let user = create_user(app, email, "pw123").await;
    let token = login(app, email, "pw123").await;
    (user, token)
}
