use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use governor::clock::Clock;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use super::auth::{extract_jwt_from_headers, AuthUser};
use crate::app::AppState;
use crate::auth::validate_jwt;
use crate::config::ConfigError;
use crate::error::ApiError;

/// Prune idle keys once the table grows past this many entries
const RETAIN_THRESHOLD: usize = 10_000;

/// Per-client request limiter: at most `requests` within any `window`, refilled continuously (GCRA).
pub struct RequestRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    requests: u32,
}

impl RequestRateLimiter {
    pub fn new(requests: u32, window: Duration) -> Result<Self, ConfigError> {
        let burst = NonZeroU32::new(requests).ok_or(ConfigError::InvalidRateLimit)?;
        let period_nanos = window.as_nanos() / u128::from(requests);
        let period = u64::try_from(period_nanos)
            .ok()
            .filter(|n| *n > 0)
            .map(Duration::from_nanos)
            .ok_or(ConfigError::InvalidRateLimit)?;
        let quota = Quota::with_period(period)
            .ok_or(ConfigError::InvalidRateLimit)?
            .allow_burst(burst);

        Ok(Self {
            limiter: RateLimiter::keyed(quota),
            requests,
        })
    }

    /// Record one request for `key`. On rejection returns how long until the next one is allowed.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        if self.limiter.len() > RETAIN_THRESHOLD {
            self.limiter.retain_recent();
        }

        let key = key.to_string();
        self.limiter
            .check_key(&key)
            .map_err(|not_until| not_until.wait_time_from(self.limiter.clock().now()))
    }

    pub fn requests(&self) -> u32 {
        self.requests
    }
}

/// Limit requests per client. Runs before authentication so rejected tokens are limited too.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return Ok(next.run(request).await);
    };

    let key = client_key(&request, &state.config.security.jwt_secret);
    if let Err(wait) = limiter.check(&key) {
        // Round up so clients never retry a moment too early
        let retry_after = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
        tracing::warn!("Rate limit exceeded for {} (retry in {}s)", key, retry_after);
        return Err(ApiError::too_many_requests(
            "Too many requests, please try again later",
            retry_after.max(1),
        ));
    }

    Ok(next.run(request).await)
}

/// User id from an already authenticated request or a valid bearer token, else the client IP
fn client_key(request: &Request, jwt_secret: &str) -> String {
    if let Some(user) = request.extensions().get::<AuthUser>() {
        return format!("user:{}", user.user_id);
    }
    if let Some(claims) = extract_jwt_from_headers(request.headers())
        .ok()
        .and_then(|token| validate_jwt(token, jwt_secret).ok())
    {
        return format!("user:{}", claims.sub);
    }
    if let Some(ip) = forwarded_for(request.headers()) {
        return format!("ip:{}", ip);
    }
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return format!("ip:{}", addr.ip());
    }
    "anonymous".to_string()
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
