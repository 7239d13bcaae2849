use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, ConfigError};
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{
    data_isolation_middleware, jwt_auth_middleware, rate_limit_middleware, RequestRateLimiter,
};
use crate::settings::SettingsStore;

/// Shared state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub settings: Arc<dyn SettingsStore>,
    pub rate_limiter: Option<Arc<RequestRateLimiter>>,
}

impl AppState {
    /// Builds the limiter from `config.api` when rate limiting is enabled.
    pub fn new(config: AppConfig, settings: Arc<dyn SettingsStore>) -> Result<Self, ConfigError> {
        let rate_limiter = if config.api.enable_rate_limiting {
            let limiter = RequestRateLimiter::new(
                config.api.rate_limit_requests,
                Duration::from_secs(config.api.rate_limit_window_secs),
            )?;
            Some(Arc::new(limiter))
        } else {
            None
        };

        Ok(Self {
            config: Arc::new(config),
            settings,
            rate_limiter,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = state.config.api.max_request_size_bytes;

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected
        .merge(settings_routes(state.clone()))
        .fallback(fallback)
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn settings_routes(state: AppState) -> Router<AppState> {
    // Layers run bottom-up: rate limit, then authenticate, then pin the tenant scope
    Router::new()
        .route(
            "/settings",
            get(protected::settings_get).put(protected::settings_put),
        )
        .route(
            "/api/settings",
            get(protected::settings_get).put(protected::settings_put),
        )
        .layer(middleware::from_fn(data_isolation_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware))
        .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-tenant-id"),
        ]);

    let origins = &config.security.cors_origins;
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring unusable CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

async fn fallback() -> ApiError {
    ApiError::not_found("Route not found")
}
