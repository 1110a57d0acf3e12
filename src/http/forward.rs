//! Forwarding to the downstream page renderer.
//!
//! Everything the edge does not answer itself ends up here: pass-through
//! pages (carrying `x-site-locale`) and paths excluded from routing.

use std::str::FromStr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        uri::{Authority, Scheme},
        StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::http::request::RequestIdExt;
use crate::http::server::AppState;
use crate::observability::metrics;

/// HTTP client bound to one upstream address.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    authority: Authority,
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("authority", &self.authority)
            .finish()
    }
}

impl Forwarder {
    pub fn new(address: &str, connect_timeout: Duration) -> Result<Self, axum::http::uri::InvalidUri> {
        let authority = Authority::from_str(address)?;
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self { client, authority })
    }

    pub async fn forward(&self, request: Request) -> Response {
        let start = Instant::now();
        let request_id = request.request_id().to_string();
        let (mut parts, body) = request.into_parts();

        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        uri_parts.authority = Some(self.authority.clone());
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(axum::http::uri::PathAndQuery::from_static("/"));
        }
        parts.uri = match Uri::from_parts(uri_parts) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Cannot build upstream URI");
                return StatusCode::BAD_REQUEST.into_response();
            }
        };

        tracing::debug!(request_id = %request_id, uri = %parts.uri, "Forwarding request");

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                metrics::record_upstream(response.status().as_u16(), start);
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Upstream error");
                metrics::record_upstream(StatusCode::BAD_GATEWAY.as_u16(), start);
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        }
    }
}

/// Fallback handler of the application router.
pub async fn forward_handler(State(state): State<AppState>, request: Request) -> Response {
    match &state.forwarder {
        Some(forwarder) => forwarder.forward(request).await,
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_rejected() {
        assert!(Forwarder::new("not an address", Duration::from_secs(1)).is_err());
    }
}
