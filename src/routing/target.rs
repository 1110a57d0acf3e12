//! The routing-relevant view of a request.

use axum::body::Body;
use axum::http::{header, Request};

/// Hostname and path of an incoming request.
///
/// The hostname is lowercased with any port removed; the pathname always
/// starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub hostname: String,
    pub pathname: String,
    pub query: Option<String>,
}

impl RequestTarget {
    pub fn new(hostname: &str, pathname: &str) -> Self {
        Self {
            hostname: normalize_host(hostname),
            pathname: normalize_path(pathname),
            query: None,
        }
    }

    pub fn with_query(mut self, query: Option<&str>) -> Self {
        self.query = query.filter(|q| !q.is_empty()).map(str::to_string);
        self
    }

    /// Extract the target from an HTTP request. The URI authority wins over
    /// the `Host` header (HTTP/2 requests carry it in `:authority`).
    pub fn from_request(req: &Request<Body>) -> Self {
        let host = req
            .uri()
            .host()
            .or_else(|| {
                req.headers()
                    .get(header::HOST)
                    .and_then(|h| h.to_str().ok())
            })
            .unwrap_or_default();

        Self::new(host, req.uri().path()).with_query(req.uri().query())
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim();
    // Bracketed IPv6 literals keep their colons.
    let without_port = if host.starts_with('[') {
        host.split_once(']')
            .map(|(addr, _)| &host[..=addr.len()])
            .unwrap_or(host)
    } else {
        host.split(':').next().unwrap_or(host)
    };
    without_port.trim_end_matches('.').to_ascii_lowercase()
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_normalization() {
        assert_eq!(RequestTarget::new("Sealos.IO:443", "/").hostname, "sealos.io");
        assert_eq!(RequestTarget::new("sealos.run.", "/").hostname, "sealos.run");
        assert_eq!(RequestTarget::new("[::1]:8080", "/").hostname, "[::1]");
    }

    #[test]
    fn test_path_gets_leading_slash() {
        assert_eq!(RequestTarget::new("a", "docs").pathname, "/docs");
        assert_eq!(RequestTarget::new("a", "").pathname, "/");
    }

    #[test]
    fn test_from_request_prefers_uri_authority() {
        let req = Request::builder()
            .uri("https://sealos.run/en/pricing?plan=pro")
            .header("Host", "sealos.io")
            .body(Body::empty())
            .unwrap();
        let target = RequestTarget::from_request(&req);
        assert_eq!(target.hostname, "sealos.run");
        assert_eq!(target.pathname, "/en/pricing");
        assert_eq!(target.query.as_deref(), Some("plan=pro"));
    }

    #[test]
    fn test_from_request_host_header() {
        let req = Request::builder()
            .uri("/zh-cn/docs")
            .header("Host", "SEALOS.IO:8080")
            .body(Body::empty())
            .unwrap();
        let target = RequestTarget::from_request(&req);
        assert_eq!(target.hostname, "sealos.io");
        assert_eq!(target.query, None);
    }
}
