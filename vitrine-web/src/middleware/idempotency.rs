//! Idempotency-key middleware
//!
//! When a client supplies `Idempotency-Key` on a mutating request, the first
//! completed response is cached by `(tenant, route, key)` and replayed for
//! subsequent identical keys without re-executing the handler. The same key
//! with a different payload fingerprint is a 409. A concurrent duplicate
//! waits a bounded time for the in-flight winner and then, best-effort, is
//! allowed through.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::WebError;
use crate::middleware::rate_limit::AdmissionState;
use crate::middleware::tenant::TenantContext;
use vitrine_interfaces::CachedResponse;

/// Idempotency key header name
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Largest request/response body the cache will hold
const MAX_CACHED_BODY: usize = 256 * 1024;

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub async fn idempotency_middleware(State(state): State<AdmissionState>, request: Request, next: Next) -> Response {
    if !is_mutating(request.method()) {
        return next.run(request).await;
    }
    let Some(client_key) = request
        .headers()
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
    else {
        return next.run(request).await;
    };

    let tenant_scope = request
        .extensions()
        .get::<Arc<TenantContext>>()
        .map(|ctx| ctx.tenant.code.clone())
        .unwrap_or_else(|| "platform".to_string());
    let store_key = format!("{}|{}|{}", tenant_scope, request.uri().path(), client_key);

    // Fingerprint needs the body; buffer and rebuild the request
    let (parts, body) = request.into_parts();
    let body_bytes = match to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return WebError::invalid_field("body", "request body too large for idempotent replay").into_response()
        }
    };
    let fingerprint = hex::encode(Sha256::digest(&body_bytes));
    let request = Request::from_parts(parts, Body::from(body_bytes.clone()));

    match state
        .store
        .claim_idempotency(&store_key, &fingerprint, state.config.idempotency_ttl)
        .await
    {
        None => {
            // This caller won the claim and executes the handler
            let response = next.run(request).await;
            cache_or_release(&state, &store_key, response).await
        }
        Some(existing) if existing.fingerprint != fingerprint => {
            warn!(key = %client_key, "idempotency key reused with different payload");
            WebError::idempotency_conflict().into_response()
        }
        Some(existing) => {
            if let Some(cached) = existing.response {
                debug!(key = %client_key, "replaying cached idempotent response");
                return replay(cached);
            }
            // First request still in flight: wait, then fall through
            let mut waited = Duration::ZERO;
            while waited < state.config.inflight_wait {
                sleep(WAIT_POLL_INTERVAL).await;
                waited += WAIT_POLL_INTERVAL;
                if let Some(record) = state.store.get_idempotency(&store_key).await {
                    if let Some(cached) = record.response {
                        debug!(key = %client_key, "in-flight winner completed, replaying");
                        return replay(cached);
                    }
                }
            }
            debug!(key = %client_key, "in-flight wait expired, allowing request through");
            next.run(request).await
        }
    }
}

async fn cache_or_release(state: &AdmissionState, store_key: &str, response: Response) -> Response {
    let status = response.status();
    if status.is_server_error() {
        // Leave the key free so the client's retry re-executes
        state.store.release_idempotency(store_key).await;
        return response;
    }

    let content_type = response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("application/json")
        .to_string();

    let (parts, body) = response.into_parts();
    let body_bytes = match to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => bytes,
        Err(_) => {
            state.store.release_idempotency(store_key).await;
            return WebError::internal("response too large to cache").into_response();
        }
    };

    state
        .store
        .complete_idempotency(
            store_key,
            CachedResponse {
                status: status.as_u16(),
                body: body_bytes.to_vec(),
                content_type,
            },
        )
        .await;

    Response::from_parts(parts, Body::from(body_bytes))
}

fn replay(cached: CachedResponse) -> Response {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);
    let mut response = Response::new(Body::from(cached.body));
    *response.status_mut() = status;
    if let Ok(value) = HeaderValue::from_str(&cached.content_type) {
        response.headers_mut().insert(axum::http::header::CONTENT_TYPE, value);
    }
    response
}

fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}
