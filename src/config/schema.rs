//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML config
//! file. Every section has defaults, so an empty file is a valid config.

use serde::{Deserialize, Serialize};

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LbConfig {
    /// Data-plane listener (client traffic).
    pub listener: ListenerConfig,

    /// Control-plane listener (backend self-registration).
    pub registration: RegistrationConfig,

    /// Upstream timeouts.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Data-plane listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:80").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:80".to_string(),
        }
    }
}

/// Registration listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Bind address (e.g., "0.0.0.0:4041").
    pub bind_address: String,

    /// Path accepting `POST` registrations.
    pub path: String,

    /// Maximum registration body size in bytes.
    pub max_body_size: usize,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4041".to_string(),
            path: "/lb/new".to_string(),
            max_body_size: 64 * 1024,
        }
    }
}

/// Timeout configuration for upstream connections.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds (0 = no timeout).
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { connect_secs: 10 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: LbConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:80");
        assert_eq!(config.registration.bind_address, "0.0.0.0:4041");
        assert_eq!(config.registration.path, "/lb/new");
        assert_eq!(config.timeouts.connect_secs, 10);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_section() {
        let config: LbConfig = toml::from_str(
            r#"
            [registration]
            bind_address = "127.0.0.1:5000"
            "#,
        )
        .unwrap();
        assert_eq!(config.registration.bind_address, "127.0.0.1:5000");
        assert_eq!(config.registration.path, "/lb/new");
    }
}
