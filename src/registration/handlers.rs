//! Registration request handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::request::Target;
use crate::load_balancer::BackendPool;
use crate::observability::metrics;

/// Registration message sent by a backend announcing itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Registration {
    /// Endpoint the load balancer should forward to.
    pub url: String,
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The body could not be decoded as a registration message.
    #[error("{0}")]
    Malformed(#[from] serde_json::Error),

    /// The message decoded but its endpoint can never be forwarded to.
    #[error("{0}")]
    UnusableEndpoint(String),
}

impl IntoResponse for RegistrationError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

/// Decode a registration body and check its endpoint is an absolute `http`
/// URL. Reachability is not checked.
pub fn decode(body: &[u8]) -> Result<Registration, RegistrationError> {
    let registration: Registration = serde_json::from_slice(body)?;
    Target::parse(&registration.url)
        .map_err(|e| RegistrationError::UnusableEndpoint(e.to_string()))?;
    Ok(registration)
}

pub async fn register(
    State(pool): State<Arc<BackendPool>>,
    body: Bytes,
) -> Result<StatusCode, RegistrationError> {
    let registration = decode(&body).inspect_err(|e| {
        tracing::warn!(error = %e, "Rejected malformed registration");
    })?;

    pool.add(registration.url);
    metrics::record_registration();
    Ok(StatusCode::OK)
}

pub async fn not_found() -> Response {
    crate::http::response::not_found()
}
