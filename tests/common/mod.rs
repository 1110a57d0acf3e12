//! Shared utilities for integration tests.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap},
    Router,
};
use tokio::net::TcpListener;

use site_edge::config::SiteConfig;
use site_edge::http::{build_router, AppState};
use site_edge::lifecycle::Shutdown;
use site_edge::HttpServer;

/// Start a page-renderer stand-in that answers `"{locale} {path}"`, where
/// `locale` is the `x-site-locale` header (or `-`).
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(|headers: HeaderMap, request: Request<Body>| async move {
        let locale = headers
            .get("x-site-locale")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        (
            [(header::CONTENT_TYPE, "text/plain")],
            format!("{locale} {}", request.uri().path()),
        )
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// The full application router, for `oneshot` tests.
#[allow(dead_code)]
pub fn app(config: SiteConfig) -> Router {
    build_router(AppState::new(config).unwrap())
}

/// Spawn the edge server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_edge(config: SiteConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });
    (addr, shutdown)
}
