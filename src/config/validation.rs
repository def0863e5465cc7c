//! Configuration validation.
//!
//! Serde handles syntax; this module checks meaning. Validation is a pure
//! function that reports every problem, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::LbConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("listener and registration share the bind address {0}")]
    SharedAddress(String),

    #[error("registration.path must be a literal path starting with '/', got {0:?}")]
    InvalidPath(String),

    #[error("registration.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("observability.log_level: unknown level {0:?}")]
    InvalidLogLevel(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &LbConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let listen = check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    let register = check_addr(
        &mut errors,
        "registration.bind_address",
        &config.registration.bind_address,
    );
    if let (Some(a), Some(b)) = (listen, register) {
        if a == b {
            errors.push(ValidationError::SharedAddress(a.to_string()));
        }
    }

    if !is_literal_route(&config.registration.path) {
        errors.push(ValidationError::InvalidPath(config.registration.path.clone()));
    }

    if config.registration.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// True for a path the router mounts verbatim: no captures, no wildcards.
pub(crate) fn is_literal_route(path: &str) -> bool {
    path.starts_with('/') && !path.contains([':', '*', '{', '}'])
}

fn check_addr(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: &str,
) -> Option<SocketAddr> {
    match value.parse() {
        Ok(addr) => Some(addr),
        Err(_) => {
            errors.push(ValidationError::InvalidAddress {
                field,
                value: value.to_string(),
            });
            None
        }
    }
}
