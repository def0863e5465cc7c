//! Forwarding one client request to one selected backend.
//!
//! # Responsibilities
//! - Send the rewritten request through the shared upstream client
//! - Return the backend's response unchanged on success
//! - Classify failures and apply them to backend health
//!
//! # Design Decisions
//! - No retries: a failed dispatch fails the client request
//! - If the client goes away, the handler future (and with it the pending
//!   upstream call) is dropped; the guard below records that as a
//!   cancellation, never as a backend failure

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;
use crate::health::{record_failure, DispatchFailure};
use crate::http::request::{into_upstream, Target};
use crate::http::response;
use crate::load_balancer::Backend;

/// Forwards requests to backends over a pooled HTTP client.
#[derive(Clone)]
pub struct Dispatcher {
    client: Client<HttpConnector, Body>,
}

impl Dispatcher {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        if timeouts.connect_secs > 0 {
            connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        }

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }

    /// Forward `request` to `backend`.
    ///
    /// Always produces a response for the client: the backend's own on
    /// success, 502 on any failure.
    pub async fn dispatch(
        &self,
        backend: &Backend,
        request: Request<Body>,
        client_addr: SocketAddr,
    ) -> Response {
        let mut guard = CancelGuard::new(backend);

        let upstream = match Target::parse(backend.endpoint())
            .and_then(|target| into_upstream(request, &target, client_addr))
        {
            Ok(req) => req,
            Err(failure) => {
                guard.disarm();
                tracing::error!(
                    backend = %backend.id(),
                    error = %failure,
                    "Cannot forward to backend"
                );
                record_failure(backend, &failure);
                return response::bad_gateway();
            }
        };

        tracing::debug!(
            backend = %backend.id(),
            method = %upstream.method(),
            uri = %upstream.uri(),
            "Forwarding request"
        );

        let result = self.client.request(upstream).await;
        guard.disarm();

        match result {
            Ok(res) => response::from_upstream(res),
            Err(e) => {
                let failure = DispatchFailure::classify(&e);
                tracing::warn!(
                    backend = %backend.id(),
                    endpoint = %backend.endpoint(),
                    kind = failure.kind(),
                    error = %failure,
                    "Upstream error"
                );
                record_failure(backend, &failure);
                response::bad_gateway()
            }
        }
    }
}

/// Records a cancellation if dropped while the upstream call is pending.
struct CancelGuard<'a> {
    backend: &'a Backend,
    armed: bool,
}

impl<'a> CancelGuard<'a> {
    fn new(backend: &'a Backend) -> Self {
        Self { backend, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            record_failure(self.backend, &DispatchFailure::Cancelled);
        }
    }
}
