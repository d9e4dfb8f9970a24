//! Success envelope
//!
//! Every JSON route answers `{"success": true, "<domain_field>": ...}`;
//! the domain field name varies per route, so the envelope is built from a
//! key and a serializable value.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Standard success response wrapper
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Map<String, Value>,
}

impl ApiResponse {
    /// `{"success": true, "<key>": <value>}`
    pub fn new(key: &str, value: impl Serialize) -> Self {
        let mut body = Map::new();
        body.insert("success".to_string(), json!(true));
        body.insert(key.to_string(), serde_json::to_value(value).unwrap_or(Value::Null));
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// Plain `{"success": true}` acknowledgement
    pub fn ok() -> Self {
        let mut body = Map::new();
        body.insert("success".to_string(), json!(true));
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add another top-level field to the envelope
    pub fn field(mut self, key: &str, value: impl Serialize) -> Self {
        self.body
            .insert(key.to_string(), serde_json::to_value(value).unwrap_or(Value::Null));
        self
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(Value::Object(self.body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let response = ApiResponse::new("tenant", json!({"code": "acme"})).field("job_id", "J-1");
        assert_eq!(response.body["success"], json!(true));
        assert_eq!(response.body["tenant"]["code"], json!("acme"));
        assert_eq!(response.body["job_id"], json!("J-1"));
    }
}
