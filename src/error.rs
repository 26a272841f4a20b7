//! Proxy error types and their HTTP rendering.
//!
//! Every failure in the request pipeline is a [`ProxyError`]. Client errors
//! (bad or disallowed input) become 400s; everything else becomes a 500.
//! The [`IntoResponse`] impl is the single place where failures are logged
//! and turned into `{"error": "..."}` bodies.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::access::NotAllowed;

/// Which side of the exchange is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or disallowed input (400).
    Client,
    /// Upstream or internal failure (500).
    Server,
}

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Neither `Origin` nor `Referer` was sent.
    #[error("missing origin: request has no origin or referer header")]
    MissingOrigin,

    /// The origin header is not an absolute URL with a host.
    #[error("invalid origin '{value}': {reason}")]
    InvalidOrigin { value: String, reason: String },

    #[error("origin {0}")]
    OriginNotAllowed(NotAllowed),

    /// Required inputs absent; the message lists them.
    #[error("{0}")]
    MissingInputs(String),

    #[error("destination {0}")]
    DestinationNotAllowed(NotAllowed),

    /// `aem-url` passed the allow-list but cannot form a request URL.
    #[error("invalid destination url '{url}': {source}")]
    InvalidDestination {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Transport-level failure talking to the destination.
    #[error("request to {url} failed: {source}")]
    Upstream {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Destination did not answer within the invocation limit.
    #[error("request to {url} did not complete within {timeout_secs}s")]
    UpstreamTimeout { url: String, timeout_secs: u64 },

    /// Destination answered with a non-success status.
    #[error("request to {url} failed with status code {status}")]
    UpstreamStatus { url: String, status: u16 },

    /// Destination body could not be read or parsed.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::MissingOrigin
            | ProxyError::InvalidOrigin { .. }
            | ProxyError::OriginNotAllowed(_)
            | ProxyError::MissingInputs(_)
            | ProxyError::DestinationNotAllowed(_) => ErrorKind::Client,
            ProxyError::InvalidDestination { .. }
            | ProxyError::Upstream { .. }
            | ProxyError::UpstreamTimeout { .. }
            | ProxyError::UpstreamStatus { .. }
            | ProxyError::Decode { .. } => ErrorKind::Server,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Client => StatusCode::BAD_REQUEST,
            ErrorKind::Server => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller.
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::Client => self.to_string(),
            ErrorKind::Server => format!("server error: {}", self),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.client_message();
        tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        (status, Json(json!({ "error": message }))).into_response()
    }
}
