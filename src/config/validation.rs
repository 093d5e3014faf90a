//! Configuration validation.
//!
//! Serde handles the syntax; this module checks semantics. Every problem is
//! collected so a bad file can be fixed in one pass.

use thiserror::Error;
use url::Url;

use crate::config::schema::LbConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please provide one or more backends to load balance")]
    NoBackends,

    #[error("backend `{url}` is not a valid URL: {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("backend `{url}` uses unsupported scheme `{scheme}` (only http is supported)")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("backend `{url}` has no host")]
    MissingHost { url: String },

    #[error("retries.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("health_check.{0} must be greater than zero")]
    ZeroHealthCheckSetting(&'static str),

    #[error("upstream.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,
}

/// Parse and check a single backend URL.
pub fn parse_backend(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidBackendUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" {
        return Err(ValidationError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::MissingHost {
            url: raw.to_string(),
        });
    }

    Ok(url)
}

/// Validate a parsed configuration, returning every error found.
pub fn validate_config(config: &LbConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    errors.extend(
        config
            .backends
            .iter()
            .filter_map(|raw| parse_backend(raw).err()),
    );

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    }

    if config.health_check.enabled {
        if config.health_check.interval_secs == 0 {
            errors.push(ValidationError::ZeroHealthCheckSetting("interval_secs"));
        }
        if config.health_check.timeout_secs == 0 {
            errors.push(ValidationError::ZeroHealthCheckSetting("timeout_secs"));
        }
    }

    if config.upstream.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
