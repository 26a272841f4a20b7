//! The proxy action.
//!
//! One linear pipeline per request:
//!
//! ```text
//! origin header → origin allow-list → [OPTIONS → preflight]
//!     → required headers → destination allow-list
//!     → outbound URL → upstream GET → success / error response
//! ```
//!
//! Nothing reaches the network until both allow-list checks have passed.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, request::Parts, Request},
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::Instrument;

use crate::config::AccessConfig;
use crate::error::{ErrorKind, ProxyError, ProxyResult};
use crate::http::request::{
    caller_origin, check_missing_request_inputs, describe_headers, header_str, AEM_URL,
    REQUIRED_HEADERS, X_REQUEST_ID,
};
use crate::http::response;
use crate::http::server::AppState;
use crate::http::upstream::{build_target_url, UpstreamClient};
use crate::observability::metrics;

/// Axum entry point: opens the per-invocation span, runs the pipeline,
/// renders failures and records metrics.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, _body) = request.into_parts();

    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let span = tracing::info_span!(
        "invocation",
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
    );

    // One snapshot per invocation; a concurrent reload never splits a request.
    let access = state.access.load_full();
    let result = handle(&state.upstream, &access, &parts)
        .instrument(span.clone())
        .await;

    let outcome = match &result {
        Ok(_) if is_preflight(&parts) => "preflight",
        Ok(_) => "forwarded",
        Err(e) if e.kind() == ErrorKind::Client => "rejected",
        Err(_) => "failed",
    };

    let response = span.in_scope(|| match result {
        Ok(response) => response,
        Err(e) => e.into_response(),
    });

    metrics::record_request(parts.method.as_str(), response.status().as_u16(), outcome, start_time);
    response
}

/// Run the pipeline for one request.
pub async fn handle(
    upstream: &UpstreamClient,
    access: &AccessConfig,
    parts: &Parts,
) -> ProxyResult<Response> {
    tracing::info!("Calling the proxy action");
    tracing::debug!(headers = %describe_headers(&parts.headers), "Inbound request");

    let caller = caller_origin(&parts.headers)?;
    access
        .allowlist_origin
        .check(caller.hostname())
        .map_err(ProxyError::OriginNotAllowed)?;

    let origin = caller.origin();
    if is_preflight(parts) {
        tracing::debug!(origin = %origin, "Answering preflight");
        return Ok(response::preflight(&origin));
    }

    if let Some(message) = check_missing_request_inputs(&parts.headers, REQUIRED_HEADERS) {
        return Err(ProxyError::MissingInputs(message));
    }

    let destination = header_str(&parts.headers, AEM_URL).unwrap_or_default();
    access
        .allowlist_destination
        .check(destination)
        .map_err(ProxyError::DestinationNotAllowed)?;

    let target = build_target_url(destination, parts.uri.path());
    let body = upstream
        .fetch(&target, parts.headers.get(AUTHORIZATION))
        .await?;
    tracing::debug!(url = %target, "Upstream request complete");

    let response = response::success(&origin, body);
    tracing::info!("{}: successful request", response.status().as_u16());
    Ok(response)
}

/// Method comparison is case-insensitive so `options` is a preflight too.
fn is_preflight(parts: &Parts) -> bool {
    parts.method.as_str().eq_ignore_ascii_case("OPTIONS")
}
