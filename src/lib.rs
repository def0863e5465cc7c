//! Round-robin HTTP load balancer with passive failure detection.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod registration;

pub use config::LbConfig;
pub use http::HttpServer;
pub use lifecycle::{Running, Shutdown};
pub use load_balancer::{Backend, BackendPool, PoolError};
