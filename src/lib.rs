//! Allow-listed proxy for AEM persisted queries.
//!
//! Forwards a browser request to the destination named in its `aem-url`
//! header, after checking the caller's origin and the destination against
//! configured allow-lists, and relays the response with CORS headers.

pub mod access;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, ProxyResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
