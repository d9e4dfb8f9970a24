//! Health endpoint, tenant-neutral by definition

use axum::response::IntoResponse;
use serde_json::json;

use vitrine_web::ApiResponse;

pub async fn health() -> impl IntoResponse {
    ApiResponse::new("status", json!("ok"))
}
