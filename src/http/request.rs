//! Inbound request inspection.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every invocation
//! - Resolve the caller's origin from `Origin` / `Referer`
//! - Check that required headers are present
//! - Render headers for debug logs without leaking credentials
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - `Origin` is preferred; `Referer` is the fallback browsers always send
//! - `Origin: null` (opaque origin) is ignored in favour of `Referer`
//! - Header values that are not visible ASCII count as missing

use axum::http::{
    header::{AUTHORIZATION, ORIGIN, REFERER},
    HeaderMap, HeaderValue, Request,
};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

use crate::error::{ProxyError, ProxyResult};

/// Header carrying the destination base URL.
pub const AEM_URL: &str = "aem-url";

/// Header used for request correlation.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Headers every forwarded (non-preflight) request must carry.
pub const REQUIRED_HEADERS: &[&str] = &[AEM_URL];

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The caller as identified by its origin header.
#[derive(Debug, Clone)]
pub struct CallerOrigin {
    url: Url,
}

impl CallerOrigin {
    /// Hostname checked against the origin allow-list.
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// `scheme://host[:port]`, echoed in `Access-Control-Allow-Origin`.
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }
}

/// Returns a header value as a string, treating empty or non-ASCII values as absent.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `Origin: null` is sent by sandboxed frames and privacy-sensitive contexts.
fn is_opaque_origin(value: &HeaderValue) -> bool {
    value.as_bytes().trim_ascii().eq_ignore_ascii_case(b"null")
}

/// Resolve the caller's origin from `Origin`, falling back to `Referer`.
/// An opaque (`null`) origin counts as absent.
pub fn caller_origin(headers: &HeaderMap) -> ProxyResult<CallerOrigin> {
    let raw = headers
        .get(ORIGIN)
        .filter(|v| !v.is_empty() && !is_opaque_origin(v))
        .or_else(|| headers.get(REFERER))
        .ok_or(ProxyError::MissingOrigin)?;

    let value = raw.to_str().map_err(|_| ProxyError::InvalidOrigin {
        value: String::from_utf8_lossy(raw.as_bytes()).into_owned(),
        reason: "not a visible ASCII string".to_string(),
    })?;

    let url = Url::parse(value.trim()).map_err(|e| ProxyError::InvalidOrigin {
        value: value.to_string(),
        reason: e.to_string(),
    })?;

    if url.host_str().is_none() {
        return Err(ProxyError::InvalidOrigin {
            value: value.to_string(),
            reason: "no host".to_string(),
        });
    }

    Ok(CallerOrigin { url })
}

/// Returns a message naming every missing header, or `None` if all are present.
pub fn check_missing_request_inputs(headers: &HeaderMap, required: &[&str]) -> Option<String> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| header_str(headers, name).is_none())
        .collect();

    if missing.is_empty() {
        None
    } else {
        Some(format!("missing header(s) '{}'", missing.join(",")))
    }
}

/// Header dump for debug logging, with credentials hidden.
pub fn describe_headers(headers: &HeaderMap) -> String {
    let mut parts: Vec<String> = headers
        .iter()
        .map(|(name, value)| {
            let shown = if *name == AUTHORIZATION {
                "<hidden>"
            } else {
                value.to_str().unwrap_or("<binary>")
            };
            format!("{}: {}", name, shown)
        })
        .collect();
    parts.sort();
    parts.join(", ")
}
