//! Rate limiting for the login endpoint.
//!
//! Uses a token bucket per client IP so password guessing is throttled before the
//! bcrypt comparison runs.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};
use tracing::warn;

use crate::api::error::ApiError;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Key used when the peer address is not known (in-process requests).
const UNKNOWN_CLIENT: &str = "unknown";

/// Tracked client count above which stale buckets are dropped.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Login attempts per minute per IP when nothing else is configured.
pub const DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE: u32 = 30;

/// Build the login limiter: `attempts_per_minute` per IP, bursting up to the same amount.
pub fn login_limiter(attempts_per_minute: NonZeroU32) -> Arc<IpLimiter> {
    Arc::new(RateLimiter::keyed(Quota::per_minute(attempts_per_minute)))
}

/// Key requests by peer IP address.
pub fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Drop fully refilled buckets once more than `max_tracked` clients are held.
pub fn prune_stale_clients(limiter: &IpLimiter, max_tracked: usize) {
    if limiter.len() > max_tracked {
        limiter.retain_recent();
    }
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(limiter): State<Arc<IpLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_key(&request);
    prune_stale_clients(&limiter, MAX_TRACKED_CLIENTS);

    match limiter.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            warn!(client = %ip, "Login rate limit exceeded");
            ApiError::too_many_requests(
                "Too many login attempts. Please wait before trying again.",
            )
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_limiter_allows_quota_then_blocks() {
        let limiter = login_limiter(NonZeroU32::new(2).unwrap());

        assert!(limiter.check_key(&"10.0.0.1".to_string()).is_ok());
        assert!(limiter.check_key(&"10.0.0.1".to_string()).is_ok());
        assert!(limiter.check_key(&"10.0.0.1".to_string()).is_err());

        // Other clients have their own bucket
        assert!(limiter.check_key(&"10.0.0.2".to_string()).is_ok());
    }

    #[test]
    fn test_prune_drops_refilled_buckets_over_threshold() {
        // Refills in about a millisecond
        let limiter = login_limiter_per_second(1000);

        for i in 0..3 {
            assert!(limiter.check_key(&format!("10.0.0.{}", i)).is_ok());
        }
        assert_eq!(limiter.len(), 3);

        std::thread::sleep(std::time::Duration::from_millis(50));

        // Under the threshold nothing is touched
        prune_stale_clients(&limiter, 10);
        assert_eq!(limiter.len(), 3);

        prune_stale_clients(&limiter, 2);
        assert_eq!(limiter.len(), 0);
    }

    #[test]
    fn test_prune_keeps_clients_still_limited() {
        let limiter = login_limiter(NonZeroU32::new(1).unwrap());

        assert!(limiter.check_key(&"10.0.0.1".to_string()).is_ok());
        assert!(limiter.check_key(&"10.0.0.2".to_string()).is_ok());

        prune_stale_clients(&limiter, 1);

        assert_eq!(limiter.len(), 2);
        assert!(limiter.check_key(&"10.0.0.1".to_string()).is_err());
    }

    fn login_limiter_per_second(n: u32) -> Arc<IpLimiter> {
        Arc::new(RateLimiter::keyed(Quota::per_second(
            NonZeroU32::new(n).unwrap(),
        )))
    }

    #[test]
    fn test_client_key_without_connect_info() {
        let request = Request::new(Body::empty());
        assert_eq!(client_key(&request), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_client_key_uses_peer_ip() {
        let mut request = Request::new(Body::empty());
        let addr: SocketAddr = "192.168.1.20:51234".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));

        assert_eq!(client_key(&request), "192.168.1.20");
    }
}
