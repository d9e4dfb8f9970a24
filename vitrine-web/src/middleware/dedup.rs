//! In-flight request deduplication
//!
//! Applied to designated endpoints only. Concurrent requests with an
//! identical argument fingerprint serialize on an in-flight marker: the
//! loser waits for the winner to finish (whose response the idempotency
//! layer may have cached) instead of running the same computation twice.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::errors::WebError;
use crate::middleware::rate_limit::AdmissionState;

const MAX_FINGERPRINT_BODY: usize = 256 * 1024;

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub async fn dedup_middleware(State(state): State<AdmissionState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match to_bytes(body, MAX_FINGERPRINT_BODY).await {
        Ok(bytes) => bytes,
        Err(_) => return WebError::invalid_field("body", "request body too large").into_response(),
    };

    let mut hasher = Sha256::new();
    hasher.update(parts.method.as_str().as_bytes());
    hasher.update(parts.uri.path().as_bytes());
    hasher.update(parts.uri.query().unwrap_or("").as_bytes());
    hasher.update(&body_bytes);
    let fingerprint = hex::encode(hasher.finalize());

    let request = Request::from_parts(parts, Body::from(body_bytes));

    if !state.store.begin_inflight(&fingerprint).await {
        debug!(%fingerprint, "identical request in flight, waiting");
        let mut waited = Duration::ZERO;
        while waited < state.config.inflight_wait {
            sleep(WAIT_POLL_INTERVAL).await;
            waited += WAIT_POLL_INTERVAL;
            if state.store.begin_inflight(&fingerprint).await {
                break;
            }
        }
        // Either we acquired the marker or the wait expired; both proceed
    }

    let response = next.run(request).await;
    state.store.end_inflight(&fingerprint).await;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::InMemoryAdmissionStore;
    use axum::http::{Method, StatusCode};
    use axum::routing::post;
    use axum::{middleware, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;
    use vitrine_config::AdmissionConfig;

    #[tokio::test]
    async fn test_concurrent_identical_requests_serialize() {
        let inflight_peak = Arc::new(AtomicUsize::new(0));
        let inflight_now = Arc::new(AtomicUsize::new(0));
        let state = AdmissionState::new(
            Arc::new(InMemoryAdmissionStore::new(100)),
            AdmissionConfig::default(),
        );

        let peak = inflight_peak.clone();
        let now = inflight_now.clone();
        let app = Router::new()
            .route(
                "/compute",
                post(move || {
                    let peak = peak.clone();
                    let now = now.clone();
                    async move {
                        let current = now.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(current, Ordering::SeqCst);
                        sleep(Duration::from_millis(50)).await;
                        now.fetch_sub(1, Ordering::SeqCst);
                        "done"
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(state, dedup_middleware));

        let make_request = || {
            axum::http::Request::builder()
                .method(Method::POST)
                .uri("/compute")
                .body(Body::from("{\"q\":1}"))
                .unwrap()
        };
        let (a, b) = tokio::join!(app.clone().oneshot(make_request()), app.clone().oneshot(make_request()));
        assert_eq!(a.unwrap().status(), StatusCode::OK);
        assert_eq!(b.unwrap().status(), StatusCode::OK);
        assert_eq!(inflight_peak.load(Ordering::SeqCst), 1, "duplicates never overlap");
    }
}
