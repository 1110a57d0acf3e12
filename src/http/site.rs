//! Site routing middleware.
//!
//! Wraps the whole application router, so a rewritten URI is dispatched to
//! the internal handler it names. Excluded paths skip the router and reach
//! the application untouched.

use std::str::FromStr;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, uri::PathAndQuery, HeaderName, HeaderValue, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::RequestIdExt;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{RequestTarget, RouteDecision};

/// Locale resolved by the router, for the page renderer.
pub const X_SITE_LOCALE: HeaderName = HeaderName::from_static("x-site-locale");

pub async fn routing_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Only the router sets the locale header.
    request.headers_mut().remove(X_SITE_LOCALE);

    if state.router.is_excluded(request.uri().path()) {
        return next.run(request).await;
    }

    let target = RequestTarget::from_request(&request);
    let decision = state.router.decide(&target);
    metrics::record_decision(&decision);

    tracing::debug!(
        request_id = %request.request_id(),
        host = %target.hostname,
        path = %target.pathname,
        decision = %decision,
        "Route decided"
    );

    match decision {
        RouteDecision::Redirect {
            location, status, ..
        } => redirect(status, &location),
        RouteDecision::Rewrite { path, .. } => {
            match rewrite_uri(request.uri(), &path) {
                Ok(uri) => *request.uri_mut() = uri,
                Err(e) => {
                    tracing::error!(path = %path, error = %e, "Rewrite target is not a valid URI");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }
            next.run(request).await
        }
        RouteDecision::PassThrough { locale, .. } => {
            if let Ok(value) = HeaderValue::from_str(locale.code()) {
                request.headers_mut().insert(X_SITE_LOCALE, value);
            }
            next.run(request).await
        }
    }
}

fn redirect(status: StatusCode, location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = status;
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(_) => {
            tracing::error!(location = %location, "Redirect target is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Replace path and query, keeping scheme and authority.
fn rewrite_uri(uri: &Uri, path: &str) -> Result<Uri, axum::http::Error> {
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::from_str(path)?);
    Ok(Uri::from_parts(parts)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_keeps_authority() {
        let uri: Uri = "https://sealos.io/robots.txt?x=1".parse().unwrap();
        let rewritten = rewrite_uri(&uri, "/api/robots").unwrap();
        assert_eq!(rewritten.to_string(), "https://sealos.io/api/robots");
    }

    #[test]
    fn test_rewrite_relative_uri() {
        let uri: Uri = "/robots.txt".parse().unwrap();
        assert_eq!(rewrite_uri(&uri, "/api/robots").unwrap().path(), "/api/robots");
    }

    #[test]
    fn test_redirect_response() {
        let response = redirect(StatusCode::TEMPORARY_REDIRECT, "https://sealos.run/zh-cn");
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "https://sealos.run/zh-cn");
    }
}
