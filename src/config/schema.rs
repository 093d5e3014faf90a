//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the load balancer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LbConfig {
    /// Interface to listen on.
    pub host: String,

    /// Listening port.
    pub port: u16,

    /// Backend URLs, in rotation order.
    pub backends: Vec<String>,

    /// Active health check settings.
    pub health_check: HealthCheckConfig,

    /// Retry and failover settings.
    pub retries: RetryConfig,

    /// Upstream connection settings.
    pub upstream: UpstreamConfig,
}

impl LbConfig {
    /// Address the listener binds to, e.g. `0.0.0.0:3030`.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for LbConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3030,
            backends: Vec::new(),
            health_check: HealthCheckConfig::default(),
            retries: RetryConfig::default(),
            upstream: UpstreamConfig::default(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// TCP connect timeout per backend in seconds.
    pub timeout_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 120,
            timeout_secs: 2,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries against the same backend before failing over.
    pub max_retries: u32,

    /// Fixed delay between same-backend retries in milliseconds.
    pub retry_delay_ms: u64,

    /// Maximum number of distinct backend attempts per request.
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 10,
            max_attempts: 3,
        }
    }
}

/// Upstream connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Time allowed for a backend to return response headers, in seconds.
    pub request_timeout_secs: u64,

    /// Largest request body buffered for replay on retry.
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}
