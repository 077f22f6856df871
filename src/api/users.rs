use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::DeletedResponse;
use super::error::{ApiError, JsonBody, ResultExt, require_non_empty};
use crate::auth::{Auth, require_auth};
use crate::db::{Database, NewUser, User, UserChanges};
use crate::jwt::JwtConfig;
use crate::password::PasswordHasher;

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub hasher: PasswordHasher,
}

/// `/add` is open so accounts can be created before anyone holds a token;
/// everything else sits behind the bearer gate.
pub fn router(state: UsersState, jwt: Arc<JwtConfig>) -> Router {
    let public = Router::new()
        .route("/add", post(create_user))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/list", get(list_users))
        .route("/update/{id}", put(update_user))
        .route("/delete/{id}", delete(delete_user))
        .with_state(state)
        .route_layer(middleware::from_fn_with_state(jwt, require_auth));

    Router::new().merge(public).merge(protected)
}

#[derive(Deserialize)]
struct CreateUserRequest {
    email: String,
    name: String,
    password: String,
    level: i64,
    status: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct UpdateUserRequest {
    email: Option<String>,
    name: Option<String>,
    password: Option<String>,
    level: Option<i64>,
    status: Option<bool>,
}

/// Stored user as returned to clients. `password` is the bcrypt hash.
#[derive(Serialize)]
struct UserResponse {
    id: String,
    email: String,
    name: String,
    password: String,
    level: i64,
    status: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            password: user.password,
            level: user.level,
            status: user.status,
        }
    }
}

async fn create_user(
    State(state): State<UsersState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = require_non_empty(&payload.email, "Email")?;
    if payload.password.is_empty() {
        return Err(ApiError::bad_request("Password cannot be empty"));
    }

    let password_hash = state
        .hasher
        .hash(&payload.password)
        .await
        .map_err(|e| ApiError::internal("Failed to hash password", e))?;

    let user = state
        .db
        .users()
        .create(&NewUser {
            email,
            name: &payload.name,
            password_hash: &password_hash,
            level: payload.level,
            status: payload.status,
        })
        .await
        .persist_err("Failed to create user")?;

    info!(user = %user.id, "User created");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

async fn list_users(
    State(state): State<UsersState>,
    Auth(caller): Auth,
) -> Result<impl IntoResponse, ApiError> {
    debug!(caller = %caller.user_id(), "Listing users");

    let users = state.db.users().list().await.db_err("Failed to list users")?;

    Ok(Json(
        users.into_iter().map(UserResponse::from).collect::<Vec<_>>(),
    ))
}

async fn update_user(
    State(state): State<UsersState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload
        .email
        .as_deref()
        .map(|email| require_non_empty(email, "Email"))
        .transpose()?;

    let password_hash = match payload.password.as_deref() {
        Some("") => return Err(ApiError::bad_request("Password cannot be empty")),
        Some(password) => Some(
            state
                .hasher
                .hash(password)
                .await
                .map_err(|e| ApiError::internal("Failed to hash password", e))?,
        ),
        None => None,
    };

    let user = state
        .db
        .users()
        .update(
            &id,
            &UserChanges {
                email,
                name: payload.name.as_deref(),
                password_hash: password_hash.as_deref(),
                level: payload.level,
                status: payload.status,
            },
        )
        .await
        .persist_err("Failed to update user")?
        .ok_or_else(|| ApiError::bad_request("User not found"))?;

    info!(user = %user.id, "User updated");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

async fn delete_user(
    State(state): State<UsersState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .users()
        .delete(&id)
        .await
        .persist_err("Failed to delete user")?;

    if !deleted {
        return Err(ApiError::bad_request("User not found"));
    }

    info!(user = %id, "User deleted");

    Ok((StatusCode::CREATED, Json(DeletedResponse::new())))
}
