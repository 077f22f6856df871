//! Bearer token gate for protected routes.
//!
//! `require_auth` runs as route middleware: it decides before the handler runs and
//! never touches the database. Handlers read the admitted identity with `Auth`.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::bearer::get_bearer_token;
use super::errors::{ApiAuthError, AuthErrorKind};
use super::types::AuthenticatedUser;
use crate::jwt::JwtConfig;

/// Decide whether the headers carry a valid access token.
pub fn authenticate(headers: &HeaderMap, jwt: &JwtConfig) -> Result<AuthenticatedUser, ApiAuthError> {
    let token = get_bearer_token(headers)
        .ok_or_else(|| ApiAuthError::new(AuthErrorKind::NotAuthenticated))?;

    let claims = jwt.validate_access_token(token).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        ApiAuthError::new(AuthErrorKind::InvalidToken)
    })?;

    Ok(AuthenticatedUser { claims })
}

/// Middleware admitting only requests with a valid bearer token.
pub async fn require_auth(
    State(jwt): State<Arc<JwtConfig>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiAuthError> {
    let user = authenticate(req.headers(), &jwt)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Extractor for the identity attached by `require_auth`.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| ApiAuthError::new(AuthErrorKind::NotAuthenticated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header},
        middleware,
        routing::get,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    const SECRET: &[u8] = b"test-secret-key-for-testing";

    fn app(called: Arc<AtomicBool>) -> Router {
        let jwt = Arc::new(JwtConfig::new(SECRET));
        Router::new()
            .route(
                "/protected",
                get(move |Auth(user): Auth| {
                    let called = called.clone();
                    async move {
                        called.store(true, Ordering::SeqCst);
                        user.user_id().to_string()
                    }
                }),
            )
            .route_layer(middleware::from_fn_with_state(jwt, require_auth))
    }

    async fn call(app: Router, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri("/protected");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_missing_header_is_401_and_handler_not_called() {
        let called = Arc::new(AtomicBool::new(false));

        let (status, _) = call(app(called.clone()), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_401() {
        let called = Arc::new(AtomicBool::new(false));

        let (status, _) = call(app(called.clone()), Some("Basic dXNlcjpwYXNz")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_garbage_token_is_403() {
        let called = Arc::new(AtomicBool::new(false));

        let (status, _) = call(app(called.clone()), Some("Bearer not-a-jwt")).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_403() {
        let called = Arc::new(AtomicBool::new(false));
        let token = JwtConfig::new(b"another-secret-entirely")
            .generate_access_token("user-1")
            .unwrap()
            .token;

        let (status, _) = call(app(called.clone()), Some(&format!("Bearer {}", token))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_valid_token_attaches_identity() {
        let called = Arc::new(AtomicBool::new(false));
        let token = JwtConfig::new(SECRET)
            .generate_access_token("user-1")
            .unwrap()
            .token;

        let (status, body) = call(app(called.clone()), Some(&format!("Bearer {}", token))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "user-1");
        assert!(called.load(Ordering::SeqCst));
    }
}
