//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every client request
//! - Resolve a backend endpoint into an upstream target
//! - Rewrite the client request for forwarding to that target
//!
//! # Design Decisions
//! - Method, path and body are forwarded unmodified; the target's own path
//!   is used as a prefix and its query is merged with the client's
//! - The client's Host header is preserved
//! - Hop-by-hop headers are stripped; X-Forwarded-For is appended

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

use crate::health::DispatchFailure;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Request ID generator backed by UUID v4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let value = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()?;
        Some(RequestId::new(value))
    }
}

/// A backend endpoint resolved into something we can forward to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    scheme: String,
    authority: String,
    path: String,
    query: Option<String>,
}

impl Target {
    /// Parse a registered endpoint. Only plain `http` is supported.
    pub fn parse(endpoint: &str) -> Result<Self, DispatchFailure> {
        let url = Url::parse(endpoint)
            .map_err(|e| DispatchFailure::InvalidEndpoint(format!("{endpoint:?}: {e}")))?;

        if url.scheme() != "http" {
            return Err(DispatchFailure::InvalidEndpoint(format!(
                "{endpoint:?}: unsupported scheme {:?}",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| {
                DispatchFailure::InvalidEndpoint(format!("{endpoint:?}: missing host"))
            })?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            authority,
            path: url.path().to_string(),
            query: url.query().map(str::to_string),
        })
    }

    /// Build the upstream URI for a client request URI.
    pub fn upstream_uri(&self, original: &Uri) -> Result<Uri, DispatchFailure> {
        let path = join_paths(&self.path, original.path());
        let query = match (self.query.as_deref(), original.query()) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => Some(format!("{a}&{b}")),
            (Some(a), _) if !a.is_empty() => Some(a.to_string()),
            (_, Some(b)) if !b.is_empty() => Some(b.to_string()),
            _ => None,
        };

        let mut uri = format!("{}://{}{}", self.scheme, self.authority, path);
        if let Some(query) = query {
            uri.push('?');
            uri.push_str(&query);
        }

        uri.parse()
            .map_err(|e| DispatchFailure::InvalidEndpoint(format!("{uri:?}: {e}")))
    }
}

/// Join the target path and the request path with exactly one slash.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

/// Rewrite a client request so it can be sent to `target`.
pub fn into_upstream(
    request: Request<Body>,
    target: &Target,
    client_addr: SocketAddr,
) -> Result<Request<Body>, DispatchFailure> {
    let (mut parts, body) = request.into_parts();

    parts.uri = target.upstream_uri(&parts.uri)?;
    strip_hop_by_hop(&mut parts.headers);
    append_forwarded_for(&mut parts.headers, client_addr);

    Ok(Request::from_parts(parts, body))
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named {
        headers.remove(name);
    }

    for name in [
        header::CONNECTION,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
    ] {
        headers.remove(name);
    }
    headers.remove("keep-alive");
    headers.remove("proxy-connection");
}

fn append_forwarded_for(headers: &mut HeaderMap, client_addr: SocketAddr) {
    let ip = client_addr.ip().to_string();
    let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) if !prior.is_empty() => format!("{prior}, {ip}"),
        _ => ip,
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(target: &str, request: &str) -> String {
        let target = Target::parse(target).unwrap();
        target.upstream_uri(&request.parse().unwrap()).unwrap().to_string()
    }

    #[test]
    fn test_bare_host_keeps_request_path() {
        assert_eq!(uri("http://10.0.0.5:9000", "/users?id=1"), "http://10.0.0.5:9000/users?id=1");
        assert_eq!(uri("http://10.0.0.5:9000", "/"), "http://10.0.0.5:9000/");
    }

    #[test]
    fn test_target_path_is_prefix() {
        assert_eq!(uri("http://backend/api", "/users"), "http://backend/api/users");
        assert_eq!(uri("http://backend/api/", "/users"), "http://backend/api/users");
    }

    #[test]
    fn test_queries_are_merged() {
        assert_eq!(uri("http://backend/?key=abc", "/x?id=1"), "http://backend/x?key=abc&id=1");
        assert_eq!(uri("http://backend/?key=abc", "/x"), "http://backend/x?key=abc");
    }

    #[test]
    fn test_ipv6_authority() {
        assert_eq!(uri("http://[::1]:8080", "/a"), "http://[::1]:8080/a");
    }

    #[test]
    fn test_invalid_endpoints() {
        assert!(matches!(Target::parse("not a url"), Err(DispatchFailure::InvalidEndpoint(_))));
        assert!(matches!(Target::parse(""), Err(DispatchFailure::InvalidEndpoint(_))));
        assert!(matches!(
            Target::parse("https://secure:443"),
            Err(DispatchFailure::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_into_upstream_rewrites_headers() {
        let request = Request::builder()
            .method("POST")
            .uri("/submit")
            .header(header::HOST, "public.example")
            .header(header::CONNECTION, "keep-alive, x-secret")
            .header("keep-alive", "timeout=5")
            .header("x-secret", "1")
            .header(X_FORWARDED_FOR, "203.0.113.7")
            .header("x-custom", "kept")
            .body(Body::empty())
            .unwrap();

        let target = Target::parse("http://127.0.0.1:9000").unwrap();
        let forwarded = into_upstream(request, &target, "192.0.2.1:5555".parse().unwrap()).unwrap();

        assert_eq!(forwarded.method(), "POST");
        assert_eq!(forwarded.uri(), "http://127.0.0.1:9000/submit");
        let headers = forwarded.headers();
        assert_eq!(headers[header::HOST], "public.example");
        assert_eq!(headers[X_FORWARDED_FOR], "203.0.113.7, 192.0.2.1");
        assert_eq!(headers["x-custom"], "kept");
        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get("keep-alive").is_none());
        assert!(headers.get("x-secret").is_none());
    }
}
