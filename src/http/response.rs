//! Response handling.
//!
//! # Responsibilities
//! - Pass backend responses through (status, headers, body)
//! - Produce the load balancer's own error responses
//!
//! # Design Decisions
//! - Backend bodies are streamed, never buffered
//! - Hop-by-hop headers stripped, everything else verbatim

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::request::strip_hop_by_hop;

/// Body sent when no backend can take the request.
pub const NO_SERVICES_BODY: &str = "No Services To Balance";

/// Body sent when the selected backend could not be reached.
pub const BAD_GATEWAY_BODY: &str = "Bad Gateway";

/// Convert a backend response into a client response.
pub fn from_upstream(response: Response<hyper::body::Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// 500 for an empty pool or a pool where every backend is dead.
pub fn no_services() -> Response {
    text(StatusCode::INTERNAL_SERVER_ERROR, NO_SERVICES_BODY)
}

/// 502 for a failed dispatch.
pub fn bad_gateway() -> Response {
    text(StatusCode::BAD_GATEWAY, BAD_GATEWAY_BODY)
}

pub fn not_found() -> Response {
    StatusCode::NOT_FOUND.into_response()
}

fn text(status: StatusCode, body: &'static str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_services_body_is_exact() {
        let response = no_services();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"No Services To Balance");
    }

    #[test]
    fn test_bad_gateway_status() {
        assert_eq!(bad_gateway().status(), StatusCode::BAD_GATEWAY);
    }
}
