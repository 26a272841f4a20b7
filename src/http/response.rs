//! Response construction.
//!
//! # Responsibilities
//! - Preflight answers (CORS headers only, no body)
//! - Success answers carrying the decoded upstream body
//! - CORS headers echoing the caller's origin with credentials allowed
//!
//! # Design Decisions
//! - The upstream's own headers are never relayed; only content type survives
//! - Error bodies are rendered by `ProxyError`, not here

use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
        },
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::http::upstream::UpstreamBody;

/// Request headers a browser may send on the real request.
pub const ALLOWED_REQUEST_HEADERS: &str = "Authorization, content-type, aem-url";

/// Diagnostic header: milliseconds since the epoch when the response was built.
pub const X_PROXY_TIMESTAMP: &str = "x-proxy-timestamp";

fn cors_headers(origin: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(origin) {
        Ok(value) => {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        Err(_) => tracing::warn!(origin = %origin, "Origin is not a valid header value, omitting allow-origin"),
    }
    headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    headers
}

/// 200 with CORS preflight headers and an empty body.
pub fn preflight(origin: &str) -> Response {
    let mut headers = cors_headers(origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_REQUEST_HEADERS),
    );
    (StatusCode::OK, headers, Body::empty()).into_response()
}

/// 200 with CORS headers, a timestamp, and the upstream body.
pub fn success(origin: &str, body: UpstreamBody) -> Response {
    let mut headers = cors_headers(origin);
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    headers.insert(X_PROXY_TIMESTAMP, HeaderValue::from(now_ms as u64));

    match body {
        UpstreamBody::Text { content_type, text } => {
            if let Ok(value) = HeaderValue::from_str(&content_type) {
                headers.insert(CONTENT_TYPE, value);
            }
            (StatusCode::OK, headers, text).into_response()
        }
        UpstreamBody::Json(value) => (StatusCode::OK, headers, Json(value)).into_response(),
    }
}
