//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler on every path
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Apply access-config reloads while serving

use arc_swap::ArcSwap;
use axum::{routing::any, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{AccessConfig, ProxyConfig};
use crate::http::handler::proxy_handler;
use crate::http::request::MakeRequestUuid;
use crate::http::upstream::UpstreamClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Current allow-lists; swapped whole on reload.
    pub access: Arc<ArcSwap<AccessConfig>>,
    pub upstream: UpstreamClient,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let state = AppState {
            access: Arc::new(ArcSwap::from_pointee(config.access.clone())),
            upstream: UpstreamClient::new(
                &config.upstream,
                Duration::from_secs(config.timeouts.invocation_secs),
            )?,
        };

        let router = Self::build_router(state.clone());
        Ok(Self {
            router,
            state,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The invocation limit lives in the upstream client, not in a layer, so
    /// an expired call is rendered and counted like every other failure.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires. Configs arriving on `config_updates` replace the
    /// allow-lists for subsequent requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            origin_allowlist = %self.config.access.allowlist_origin,
            destination_allowlist = %self.config.access.allowlist_destination,
            "HTTP server starting"
        );

        let access = self.state.access.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                tracing::info!(
                    origin_allowlist = %new_config.access.allowlist_origin,
                    destination_allowlist = %new_config.access.allowlist_destination,
                    "Applying reloaded access configuration"
                );
                access.store(Arc::new(new_config.access));
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Router with all layers, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}
