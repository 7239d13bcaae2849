#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use fishledger_api::app::{router, AppState};
use fishledger_api::auth::{generate_jwt, Claims};
use fishledger_api::config::AppConfig;
use fishledger_api::settings::MemorySettingsStore;

/// Full router over the in-memory store, driven with `oneshot`
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemorySettingsStore>,
    pub config: AppConfig,
}

/// Response status, headers and parsed JSON body (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// An authenticated caller
#[derive(Clone, Copy, Debug)]
pub struct TestUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
}

impl TestUser {
    pub fn new() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
        }
    }
}

impl TestApp {
    pub fn new() -> Self {
        let mut config = AppConfig::development();
        config.api.enable_rate_limiting = false;
        Self::with_config(config)
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemorySettingsStore::new());
        let state = AppState::new(config.clone(), store.clone()).expect("valid test config");
        Self {
            router: router(state),
            store,
            config,
        }
    }

    pub fn token_for(&self, user: &TestUser) -> String {
        let claims = Claims::new(user.user_id, user.tenant_id, Some("owner@test.fishledger.app".into()), 1)
            .expect("claims");
        generate_jwt(&claims, &self.config.security.jwt_secret).expect("token generation")
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<TestResponse> {
        self.send(Method::GET, path, token, &[], None).await
    }

    pub async fn put_json(&self, path: &str, token: Option<&str>, body: &Value) -> Result<TestResponse> {
        self.send(Method::PUT, path, token, &[], Some(body.to_string())).await
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        extra_headers: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(body.map(Body::from).unwrap_or_else(Body::empty))?;

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok(TestResponse { status, headers, body })
    }
}
