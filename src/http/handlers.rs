//! Internal handlers that generate asset content on request.

use axum::{
    extract::{Request, State},
    http::header,
    response::{Html, IntoResponse},
};

use crate::http::server::AppState;
use crate::routing::RequestTarget;

/// `GET /api/robots`, the target of the `/robots.txt` rewrite.
///
/// The host is read the way the router reads it, so the sitemap matches the
/// domain the request was routed on.
pub async fn robots(State(state): State<AppState>, request: Request) -> impl IntoResponse {
    let request_host = RequestTarget::from_request(&request).hostname;

    let domains = &state.config.domains;
    // Only advertise hosts we serve.
    let host = if request_host == domains.primary_host || request_host == domains.secondary_host {
        request_host
    } else {
        domains.primary_host.clone()
    };

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_robots(&domains.scheme, &host),
    )
}

pub fn render_robots(scheme: &str, host: &str) -> String {
    format!("User-agent: *\nAllow: /\n\nSitemap: {scheme}://{host}/sitemap.xml\n")
}

/// `GET /api/analytics`, the analytics head snippet.
pub async fn analytics_snippet(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "public, max-age=300")],
        Html(state.snippet.to_string()),
    )
}
