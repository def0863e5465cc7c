//! Data-plane HTTP server.
//!
//! # Responsibilities
//! - Accept every method and path from clients
//! - Select a backend from the shared pool
//! - Dispatch the request outside the pool lock
//! - Sweep dead backends once the dispatch is over
//! - Wire up middleware (request ID, tracing)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::LbConfig;
use crate::http::dispatch::Dispatcher;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::http::response;
use crate::lifecycle::ShutdownSignal;
use crate::load_balancer::{BackendPool, PoolError};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<BackendPool>,
    pub dispatcher: Dispatcher,
}

/// HTTP server for client traffic.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a data-plane server balancing over `pool`.
    pub fn new(pool: Arc<BackendPool>, config: &LbConfig) -> Self {
        let state = AppState {
            pool,
            dispatcher: Dispatcher::new(&config.timeouts),
        };
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let request_id = axum::http::HeaderName::from_static(X_REQUEST_ID);
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, UuidRequestId))
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Data plane listening");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.recv())
            .await?;

        tracing::info!("Data plane stopped");
        Ok(())
    }
}

/// Runs an eviction sweep when dropped, whether the dispatch completed or
/// was cancelled.
struct EvictOnDrop<'a> {
    pool: &'a BackendPool,
}

impl Drop for EvictOnDrop<'_> {
    fn drop(&mut self) {
        self.pool.evict();
    }
}

/// Select a backend and forward the request to it.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();

    let selection = match state.pool.select_next() {
        Ok(selection) => selection,
        Err(e) => {
            tracing::warn!(
                error = %e,
                method = %request.method(),
                path = %request.uri().path(),
                "No backend available"
            );
            if e == PoolError::AllBackendsDead {
                state.pool.evict();
            }
            metrics::record_request(500, start);
            return response::no_services();
        }
    };

    let _sweep = selection
        .encountered_dead
        .then(|| EvictOnDrop { pool: &state.pool });

    let response = state
        .dispatcher
        .dispatch(&selection.backend, request, client_addr)
        .await;

    metrics::record_request(response.status().as_u16(), start);
    response
}
