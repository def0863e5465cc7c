//! passive-lb
//!
//! A Layer-7 HTTP load balancer. Backends register themselves over HTTP;
//! client traffic is spread across them round-robin. A backend that fails a
//! forwarded request is marked dead and evicted from rotation.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!   Backend          │                 LOAD BALANCER                │
//!   POST /lb/new ────┼─▶ registration ──▶ pool.add()                │
//!                    │                        │                     │
//!                    │                   ┌────▼─────┐               │
//!   Client ──────────┼─▶ http server ───▶│   pool   │ select_next() │
//!                    │        │          └────┬─────┘               │
//!                    │        │   (lock released before forwarding) │
//!                    │        ▼               │                     │
//!   Client ◀─────────┼── dispatch ◀───────────┘ ───────────────────┼──▶ Backend
//!                    │        │                                     │
//!                    │        └─ failure? mark dead ─▶ evict()      │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use passive_lb::config::{load_config, validate_config, ConfigError, LbConfig};
use passive_lb::lifecycle::{self, signals};
use passive_lb::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "passive-lb")]
#[command(version)]
#[command(about = "Round-robin HTTP load balancer with backend self-registration")]
struct Cli {
    /// Path to a TOML config file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the data-plane bind address
    #[arg(long, value_name = "ADDR")]
    listen: Option<String>,

    /// Override the registration bind address
    #[arg(long, value_name = "ADDR")]
    registration_listen: Option<String>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init(&config.observability.log_level);
    tracing::info!("passive-lb v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        // Validated above.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let running = lifecycle::start(&config).await?;

    signals::wait_for_signal().await;
    tracing::info!("Shutting down");
    running.shutdown().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Load the config file (if any), apply CLI overrides, then validate.
fn resolve_config(cli: &Cli) -> Result<LbConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LbConfig::default(),
    };

    if let Some(addr) = &cli.listen {
        config.listener.bind_address = addr.clone();
    }
    if let Some(addr) = &cli.registration_listen {
        config.registration.bind_address = addr.clone();
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
