//! Startup orchestration.
//!
//! Builds the single shared pool, binds both listeners, and spawns the data
//! plane and the registration plane. Any bind failure is fatal.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::validation::is_literal_route;
use crate::config::LbConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::load_balancer::BackendPool;
use crate::registration;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid {field} {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("registration path {0:?} is not a literal route")]
    InvalidPath(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to a running load balancer.
pub struct Running {
    data_addr: SocketAddr,
    registration_addr: SocketAddr,
    pool: Arc<BackendPool>,
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<std::io::Result<()>>>,
}

impl Running {
    /// Address the data plane is bound to.
    pub fn data_addr(&self) -> SocketAddr {
        self.data_addr
    }

    /// Address the registration plane is bound to.
    pub fn registration_addr(&self) -> SocketAddr {
        self.registration_addr
    }

    /// The pool shared by both planes.
    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    /// Trigger graceful shutdown and wait for both planes to stop.
    pub async fn shutdown(self) -> std::io::Result<()> {
        self.shutdown.trigger();
        for task in self.tasks {
            match task.await {
                Ok(result) => result?,
                Err(e) => tracing::error!(error = %e, "Server task panicked"),
            }
        }
        Ok(())
    }
}

/// Bind both listeners and start serving.
pub async fn start(config: &LbConfig) -> Result<Running, StartupError> {
    if !is_literal_route(&config.registration.path) {
        return Err(StartupError::InvalidPath(config.registration.path.clone()));
    }

    let data_listener = bind("listener.bind_address", &config.listener.bind_address).await?;
    let registration_listener = bind(
        "registration.bind_address",
        &config.registration.bind_address,
    )
    .await?;

    let data_addr = local_addr(&data_listener)?;
    let registration_addr = local_addr(&registration_listener)?;

    let pool = Arc::new(BackendPool::new());
    let shutdown = Shutdown::new();

    let server = HttpServer::new(pool.clone(), config);
    let router = registration::setup_registration_router(pool.clone(), &config.registration);

    let tasks = vec![
        tokio::spawn(server.run(data_listener, shutdown.subscribe())),
        tokio::spawn(registration::run(
            router,
            registration_listener,
            shutdown.subscribe(),
        )),
    ];

    tracing::info!(
        data = %data_addr,
        registration = %registration_addr,
        path = %config.registration.path,
        "Load balancer started"
    );

    Ok(Running {
        data_addr,
        registration_addr,
        pool,
        shutdown,
        tasks,
    })
}

async fn bind(field: &'static str, value: &str) -> Result<TcpListener, StartupError> {
    let addr: SocketAddr = value.parse().map_err(|_| StartupError::InvalidAddress {
        field,
        value: value.to_string(),
    })?;
    TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })
}

fn local_addr(listener: &TcpListener) -> Result<SocketAddr, StartupError> {
    // Only fails if the socket is already closed.
    listener.local_addr().map_err(|source| StartupError::Bind {
        addr: SocketAddr::from(([0, 0, 0, 0], 0)),
        source,
    })
}
