//! Sliding-window rate limiting middleware
//!
//! Keyed by `(route, user id | client ip)`. The admission store is
//! best-effort shared state: when rate limiting is disabled or the store is
//! unavailable the middleware degrades to pass-through (fail-open).

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

use crate::errors::WebError;
use crate::middleware::auth::AuthContext;
use vitrine_config::AdmissionConfig;
use vitrine_interfaces::{AdmissionStore, RateLimitDecision};

/// Shared state for the admission middlewares
#[derive(Clone)]
pub struct AdmissionState {
    pub store: Arc<dyn AdmissionStore>,
    pub config: AdmissionConfig,
}

impl AdmissionState {
    pub fn new(store: Arc<dyn AdmissionStore>, config: AdmissionConfig) -> Self {
        Self { store, config }
    }
}

pub async fn rate_limit_middleware(State(state): State<AdmissionState>, request: Request, next: Next) -> Response {
    if !state.config.rate_limit_enabled {
        return next.run(request).await;
    }

    let auth = request
        .extensions()
        .get::<Arc<AuthContext>>()
        .map(|ctx| ctx.as_ref().clone())
        .unwrap_or_default();

    let caller = match auth.user_id {
        Some(user_id) => format!("user:{user_id}"),
        None => format!("ip:{}", client_ip(&request)),
    };
    let key = format!("{}|{}", request.uri().path(), caller);
    let limit = if auth.is_authenticated {
        state.config.user_limit
    } else {
        state.config.anonymous_limit
    };

    match state.store.check_rate(&key, limit, state.config.window).await {
        RateLimitDecision::Allowed => next.run(request).await,
        RateLimitDecision::Limited { retry_after_secs } => {
            warn!(%key, "request rate limited");
            let mut response = WebError::rate_limited().into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
            }
            response
        }
    }
}

fn client_ip(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
    {
        return forwarded.trim().to_string();
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::InMemoryAdmissionStore;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app(limit: u32) -> Router {
        let mut config = AdmissionConfig::default();
        config.anonymous_limit = limit;
        let state = AdmissionState::new(Arc::new(InMemoryAdmissionStore::new(100)), config);
        Router::new()
            .route("/limited", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
    }

    #[tokio::test]
    async fn test_limit_enforced_with_retry_after() {
        let app = app(2);
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(axum::http::Request::builder().uri("/limited").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app
            .oneshot(axum::http::Request::builder().uri("/limited").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(axum::http::header::RETRY_AFTER));
    }

    #[tokio::test]
    async fn test_disabled_is_pass_through() {
        let mut config = AdmissionConfig::default();
        config.rate_limit_enabled = false;
        config.anonymous_limit = 1;
        let state = AdmissionState::new(Arc::new(InMemoryAdmissionStore::new(100)), config);
        let app = Router::new()
            .route("/limited", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state, rate_limit_middleware));

        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(axum::http::Request::builder().uri("/limited").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
