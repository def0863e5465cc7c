//! Passive health checking (failure detection).
//!
//! # Responsibilities
//! - Classify the outcome of a forwarded request
//! - Mark the backend dead on a transport failure
//!
//! # Design Decisions
//! - Only transport failures count; any HTTP response (including 5xx) is a
//!   sign of life and is passed through untouched
//! - Cancellation is transient and never changes backend state. Only the
//!   dispatcher records it, when the client goes away mid-request; every
//!   error the upstream client returns counts against the backend, including
//!   hyper's "canceled" for a connection the backend closed
//! - One failure is enough; there are no thresholds and no revival

use std::error::Error as StdError;

use thiserror::Error;

use crate::load_balancer::Backend;
use crate::observability::metrics;

/// Why a dispatch did not produce a backend response.
#[derive(Debug, Error)]
pub enum DispatchFailure {
    /// The request was cancelled on our side before the backend answered.
    #[error("request cancelled")]
    Cancelled,

    /// Connection refused, DNS failure, reset, connect timeout, ...
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The registered endpoint is not a usable http URL.
    #[error("invalid backend endpoint: {0}")]
    InvalidEndpoint(String),
}

impl DispatchFailure {
    /// Classify an error returned by the upstream HTTP client.
    pub fn classify(err: &(dyn StdError + 'static)) -> Self {
        DispatchFailure::Unreachable(error_chain(err))
    }

    /// True if this failure is attributed to the backend.
    pub fn is_backend_failure(&self) -> bool {
        !matches!(self, DispatchFailure::Cancelled)
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchFailure::Cancelled => "cancelled",
            DispatchFailure::Unreachable(_) => "unreachable",
            DispatchFailure::InvalidEndpoint(_) => "invalid_endpoint",
        }
    }
}

/// Apply a dispatch failure to the backend's health.
pub fn record_failure(backend: &Backend, failure: &DispatchFailure) {
    metrics::record_dispatch_failure(failure.kind());

    if !failure.is_backend_failure() {
        tracing::debug!(
            backend = %backend.id(),
            endpoint = %backend.endpoint(),
            "Dispatch cancelled, backend state unchanged"
        );
        return;
    }

    if backend.mark_dead() {
        tracing::warn!(
            backend = %backend.id(),
            endpoint = %backend.endpoint(),
            reason = %failure,
            "Backend marked dead"
        );
    }
}

/// Render an error and its sources as "outer: inner: root".
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        let msg = e.to_string();
        if !out.contains(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        current = e.source();
    }
    out
}
