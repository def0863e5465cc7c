//! Control plane: backend self-registration.
//!
//! # Endpoints
//! - `POST <registration.path>` with `{"url": "<endpoint>"}`: add a backend
//!   (400 if the body is not such a message or the endpoint is not an
//!   absolute `http` URL)
//! - anything else: 404
//!
//! # Design Decisions
//! - Bodies are decoded regardless of Content-Type
//! - The endpoint is not probed; an unreachable one is discovered on first
//!   dispatch
//! - No authentication

pub mod handlers;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::post, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::RegistrationConfig;
use crate::lifecycle::ShutdownSignal;
use crate::load_balancer::BackendPool;
use self::handlers::{not_found, register};

pub use handlers::{Registration, RegistrationError};

pub fn setup_registration_router(pool: Arc<BackendPool>, config: &RegistrationConfig) -> Router {
    Router::new()
        .route(&config.path, post(register).fallback(not_found))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}

/// Serve the registration router on `listener` until `shutdown` fires.
pub async fn run(
    router: Router,
    listener: TcpListener,
    shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Registration listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.recv())
        .await?;

    tracing::info!("Registration stopped");
    Ok(())
}
