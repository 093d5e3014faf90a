//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Track liveness (alive / down)
//! - Forward requests through the backend's bound upstream

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use axum::body::Body;
use axum::http::Response;
use thiserror::Error;
use url::Url;

use crate::http::request::ForwardRequest;
use crate::load_balancer::upstream::{ForwardError, Upstream};

/// A backend URL that cannot be turned into a dialable address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("backend `{0}` has no host")]
    MissingHost(String),

    #[error("backend `{0}` has no port and its scheme has no default")]
    MissingPort(String),
}

/// A single backend server.
pub struct Backend {
    url: Url,
    /// `host:port` used for connectivity probes.
    address: String,
    alive: RwLock<bool>,
    upstream: Arc<dyn Upstream>,
}

impl Backend {
    /// Create a backend that starts out alive.
    pub fn new(url: Url, upstream: Arc<dyn Upstream>) -> Result<Self, EndpointError> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| EndpointError::MissingHost(url.to_string()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| EndpointError::MissingPort(url.to_string()))?;
        let address = format!("{}:{}", host, port);

        Ok(Self {
            url,
            address,
            alive: RwLock::new(true),
            upstream,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    // --- Liveness ---

    /// Set the liveness flag, logging when it actually changes.
    pub fn set_alive(&self, alive: bool) {
        let previous = {
            let mut guard = self.alive.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, alive)
        };

        if previous != alive {
            tracing::info!(
                backend = %self.url,
                status = status_label(alive),
                "Backend status changed"
            );
        }
    }

    pub fn is_alive(&self) -> bool {
        *self.alive.read().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Forwarding ---

    /// Forward one attempt of `request` to this backend.
    pub async fn forward(&self, request: &ForwardRequest) -> Result<Response<Body>, ForwardError> {
        self.upstream.forward(request).await
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("url", &self.url.as_str())
            .field("alive", &self.is_alive())
            .finish_non_exhaustive()
    }
}

pub(crate) fn status_label(alive: bool) -> &'static str {
    if alive {
        "up"
    } else {
        "down"
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted upstreams for exercising selection and failover without sockets.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures_util::future::BoxFuture;

    use super::*;

    /// Upstream that either always succeeds (echoing its name) or always fails.
    pub struct ScriptedUpstream {
        name: &'static str,
        fail: bool,
        calls: AtomicUsize,
    }

    impl ScriptedUpstream {
        pub fn healthy(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Upstream for ScriptedUpstream {
        fn forward<'a>(
            &'a self,
            _request: &'a ForwardRequest,
        ) -> BoxFuture<'a, Result<Response<Body>, ForwardError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if self.fail {
                    Err(ForwardError::Timeout(Duration::ZERO))
                } else {
                    Ok(Response::new(Body::from(self.name)))
                }
            })
        }
    }

    /// A backend at `http://{name}.test:80` wired to `upstream`.
    pub fn backend(name: &str, upstream: Arc<ScriptedUpstream>) -> Arc<Backend> {
        let url = Url::parse(&format!("http://{}.test", name)).unwrap();
        Arc::new(Backend::new(url, upstream).unwrap())
    }
}
