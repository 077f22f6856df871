//! Credential login: exchanges email + password for an access token.

use axum::{Json, Router, extract::State, middleware, response::IntoResponse, routing::post};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ApiError, JsonBody, ResultExt};
use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::password::PasswordHasher;
use crate::rate_limit::{IpLimiter, rate_limit_login};

#[derive(Clone)]
pub struct LoginState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub hasher: PasswordHasher,
}

pub fn router(state: LoginState, limiter: Option<Arc<IpLimiter>>) -> Router {
    let router = Router::new()
        .route("/login", post(login))
        .with_state(state);

    match limiter {
        Some(limiter) => router.route_layer(middleware::from_fn_with_state(limiter, rate_limit_login)),
        None => router,
    }
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
}

async fn login(
    State(state): State<LoginState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Stored emails are trimmed on create and update
    let user = state
        .db
        .users()
        .get_by_email(payload.email.trim())
        .await
        .db_err("Failed to look up user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let matches = state
        .hasher
        .verify(&payload.password, &user.password)
        .await
        .map_err(|e| ApiError::internal("Failed to verify password", e))?;

    if !matches {
        debug!(user = %user.id, "Login rejected: wrong password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let access = state
        .jwt
        .generate_access_token(&user.id)
        .map_err(|e| ApiError::internal("Failed to generate access token", e))?;

    info!(user = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token: access.token,
    }))
}
