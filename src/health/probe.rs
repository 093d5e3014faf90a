//! Raw TCP reachability check.

use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time;

/// Why a backend could not be reached.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("site unreachable ({address}): {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("site unreachable ({address}): no connection within {timeout:?}")]
    Timeout { address: String, timeout: Duration },
}

/// Open and immediately drop a TCP connection to `address`.
pub async fn probe_tcp(address: &str, timeout: Duration) -> Result<(), ProbeFailure> {
    match time::timeout(timeout, TcpStream::connect(address)).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(source)) => Err(ProbeFailure::Connect {
            address: address.to_string(),
            source,
        }),
        Err(_) => Err(ProbeFailure::Timeout {
            address: address.to_string(),
            timeout,
        }),
    }
}
