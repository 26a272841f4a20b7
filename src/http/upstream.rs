//! Outbound call to the destination.
//!
//! # Responsibilities
//! - Derive the outbound URL from `aem-url` and the inbound path
//! - Perform a single GET carrying the caller's `authorization`
//! - Decode the body as text (HTML-like) or JSON (everything else)
//!
//! # Design Decisions
//! - No retries; the invocation limit bounds the call and expiry is a server error
//! - Only `authorization` is forwarded; no other inbound header, no body
//! - The authorization value never appears in errors or logs

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue,
};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::{ProxyError, ProxyResult};

/// Decoded upstream body.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    /// HTML-like response, relayed verbatim with its content type.
    Text { content_type: String, text: String },
    /// Any other response, parsed as JSON.
    Json(Value),
}

/// Join the destination base and the inbound path.
///
/// Trailing slashes on the base are dropped and every literal `;` in the path
/// becomes `%3B`, so persisted-query parameters cannot be reinterpreted upstream.
pub fn build_target_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path.replace(';', "%3B"))
}

/// Returns true for content types whose body is relayed as text.
pub fn is_html(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("html")
}

/// HTTP client for the destination. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    /// Upper bound on the whole round trip, body included.
    limit: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig, limit: Duration) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        Ok(Self {
            client: builder.build()?,
            limit,
        })
    }

    /// GET `url`, forwarding `authorization` unchanged when present.
    ///
    /// Fails with [`ProxyError::UpstreamTimeout`] once the invocation limit
    /// passes; the in-flight request is dropped.
    pub async fn fetch(&self, url: &str, authorization: Option<&HeaderValue>) -> ProxyResult<UpstreamBody> {
        match tokio::time::timeout(self.limit, self.round_trip(url, authorization)).await {
            Ok(result) => result,
            Err(_) => Err(ProxyError::UpstreamTimeout {
                url: url.to_string(),
                timeout_secs: self.limit.as_secs(),
            }),
        }
    }

    async fn round_trip(&self, url: &str, authorization: Option<&HeaderValue>) -> ProxyResult<UpstreamBody> {
        let target = Url::parse(url).map_err(|source| ProxyError::InvalidDestination {
            url: url.to_string(),
            source,
        })?;

        let mut request = self.client.get(target);
        if let Some(auth) = authorization {
            request = request.header(AUTHORIZATION, auth.clone());
        }

        let response = request.send().await.map_err(|source| ProxyError::Upstream {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        tracing::debug!(url = %url, status = status.as_u16(), content_type = %content_type, "Upstream responded");

        if is_html(&content_type) {
            let text = response.text().await.map_err(|source| ProxyError::Decode {
                url: url.to_string(),
                source,
            })?;
            Ok(UpstreamBody::Text { content_type, text })
        } else {
            let json = response.json::<Value>().await.map_err(|source| ProxyError::Decode {
                url: url.to_string(),
                source,
            })?;
            Ok(UpstreamBody::Json(json))
        }
    }
}
