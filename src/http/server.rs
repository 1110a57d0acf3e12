//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the internal handlers
//! - Wrap it in the site routing middleware
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::Layer;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::analytics::{render_head_snippet, LoadPlan};
use crate::config::SiteConfig;
use crate::http::forward::{forward_handler, Forwarder};
use crate::http::handlers;
use crate::http::request::MakeRequestUuidV4;
use crate::http::site::routing_middleware;
use crate::routing::{RouterError, SiteRouter};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("router: {0}")]
    Router(#[from] RouterError),

    #[error("upstream address: {0}")]
    Upstream(#[from] axum::http::uri::InvalidUri),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<SiteRouter>,
    pub config: Arc<SiteConfig>,
    /// Rendered once at startup; the analytics config never changes.
    pub snippet: Arc<str>,
    pub forwarder: Option<Forwarder>,
}

impl AppState {
    pub fn new(config: SiteConfig) -> Result<Self, ServerError> {
        let router = Arc::new(SiteRouter::from_config(&config)?);
        let snippet = render_head_snippet(&LoadPlan::from_config(&config.analytics));
        let forwarder = config
            .upstream
            .address
            .as_deref()
            .map(|addr| Forwarder::new(addr, Duration::from_secs(config.timeouts.connect_secs)))
            .transpose()?;

        Ok(Self {
            router,
            config: Arc::new(config),
            snippet: Arc::from(snippet),
            forwarder,
        })
    }
}

/// HTTP server for the site edge.
pub struct HttpServer {
    router: Router,
    config: Arc<SiteConfig>,
}

impl HttpServer {
    pub fn new(config: SiteConfig) -> Result<Self, ServerError> {
        let state = AppState::new(config)?;
        let config = state.config.clone();
        Ok(Self {
            router: build_router(state),
            config,
        })
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = ?self.config.upstream.address,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the full application: internal handlers and upstream fallback,
/// wrapped by the routing middleware, under the request-id, trace and
/// timeout layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.timeouts.request_secs);

    let app = Router::new()
        .route("/api/robots", get(handlers::robots))
        .route("/api/analytics", get(handlers::analytics_snippet))
        .fallback(forward_handler)
        .with_state(state.clone());

    // Layered around the router (not via Router::layer) so a rewritten URI
    // is routed again.
    let site = middleware::from_fn_with_state(state, routing_middleware).layer(app);

    Router::new()
        .fallback_service(site)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
}
