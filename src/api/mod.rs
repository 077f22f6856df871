pub mod error;
mod expenses;
mod login;
mod users;

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::auth::require_auth;
use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::password::PasswordHasher;
use crate::rate_limit::login_limiter;

pub use expenses::ExpensesState;
pub use login::LoginState;
pub use users::UsersState;

/// Body returned by the delete endpoints.
#[derive(Serialize)]
struct DeletedResponse {
    message: &'static str,
}

impl DeletedResponse {
    fn new() -> Self {
        Self {
            message: "Deleted successfully",
        }
    }
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// 404 for any path or method without a handler.
pub(crate) async fn not_found_handler() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(MessageResponse {
            message: "Route not found",
        }),
    )
        .into_response()
}

/// Create the API router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    hasher: PasswordHasher,
    login_rate_limit: Option<NonZeroU32>,
) -> Router {
    let login_state = LoginState {
        db: db.clone(),
        jwt: jwt.clone(),
        hasher,
    };

    let users_state = UsersState {
        db: db.clone(),
        hasher,
    };

    let expenses_state = ExpensesState { db };

    // Set after the route layers: a wrong method on a known path gets the plain 404,
    // with or without a token
    let login = login::router(login_state, login_rate_limit.map(login_limiter))
        .method_not_allowed_fallback(not_found_handler);

    let users = users::router(users_state, jwt.clone())
        .method_not_allowed_fallback(not_found_handler);

    let expenses = expenses::router(expenses_state)
        .route_layer(middleware::from_fn_with_state(jwt, require_auth))
        .method_not_allowed_fallback(not_found_handler);

    Router::new()
        .merge(login)
        .nest("/user", users)
        .nest("/expense", expenses)
}
