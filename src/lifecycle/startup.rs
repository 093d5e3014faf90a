//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn validated configuration into a backend pool
//! - Bind the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::validation::{parse_backend, ValidationError};
use crate::config::{ConfigError, LbConfig};
use crate::load_balancer::upstream::build_client;
use crate::load_balancer::{Backend, EndpointError, HttpUpstream, ServerPool};

/// Anything fatal to the process: bad configuration, bind failure, or the
/// server loop itself erroring out.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] ValidationError),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Build the server pool from validated configuration, in configuration order.
pub fn build_pool(config: &LbConfig) -> Result<ServerPool, StartupError> {
    let client = build_client(Duration::from_secs(config.upstream.connect_timeout_secs));
    let request_timeout = Duration::from_secs(config.upstream.request_timeout_secs);

    let mut pool = ServerPool::new();
    for raw in &config.backends {
        let url = parse_backend(raw)?;
        let upstream = HttpUpstream::new(client.clone(), url.clone(), request_timeout);
        let backend = Backend::new(url, Arc::new(upstream))?;

        tracing::info!(backend = %backend.url(), "Configured server");
        pool.add_backend(Arc::new(backend));
    }

    Ok(pool)
}

/// Bind the configured listen address.
pub async fn bind_listener(config: &LbConfig) -> Result<TcpListener, StartupError> {
    let address = config.listen_address();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}
