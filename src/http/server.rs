//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Install the forwarded header normalizer (fails fast at startup)
//! - Create Axum Router with diagnostic handlers
//! - Wire up middleware (request ID, tracing, timeout, transport variables, hook)
//! - Turn handler panics into 500 responses
//! - Serve until the shutdown future resolves

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::details;
use crate::http::forwarded::ForwardedHeadersLayer;
use crate::http::variables::TransportVariablesLayer;
use crate::normalize::{ForwardedHeaderNormalizer, StartupError};
use crate::variables::TransportVariables;

/// HTTP server hosting the normalized application.
pub struct HttpServer {
    config: AppConfig,
    normalizer: Option<ForwardedHeaderNormalizer<TransportVariables>>,
}

impl HttpServer {
    /// Create a server, installing the normalizer if the switch is on.
    pub fn new(config: AppConfig) -> Result<Self, StartupError> {
        let normalizer = ForwardedHeaderNormalizer::install(&config.forwarded_headers)?;
        Ok(Self { config, normalizer })
    }

    /// Whether the begin-request hook is part of the chain.
    pub fn normalizes(&self) -> bool {
        self.normalizer.is_some()
    }

    /// Build the Axum router for a listener bound to `local_addr`.
    #[allow(deprecated)]
    pub fn router(&self, local_addr: SocketAddr) -> Router {
        let mut router = Router::new()
            .route(
                "/_details",
                get(details::request_details).post(details::request_details),
            )
            .route(
                "/_details.json",
                get(details::request_details_json).post(details::request_details_json),
            )
            .route("/_error", get(details::intentional_error))
            .fallback(details::greeting)
            .layer(CatchPanicLayer::new());

        if let Some(normalizer) = &self.normalizer {
            router = router.layer(ForwardedHeadersLayer::new(
                Arc::new(normalizer.clone()),
                self.config.forwarded_headers.sync_request_headers,
            ));
        }

        router
            .layer(TransportVariablesLayer::new(local_addr))
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            normalize_forwarded_headers = self.normalizes(),
            "HTTP server starting"
        );

        let app = self
            .router(addr)
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
