//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, invocation timeout)
//!     → handler.rs (the proxy pipeline)
//!         → request.rs (origin, required headers)
//!         → upstream.rs (outbound URL, GET, body decoding)
//!         → response.rs (CORS, preflight, success body)
//!     → Send to client
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::{MakeRequestUuid, AEM_URL, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
pub use upstream::{UpstreamBody, UpstreamClient};
