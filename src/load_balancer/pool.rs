//! Backend pool management.
//!
//! # Responsibilities
//! - Hold the ordered backend list (configuration order)
//! - Select the next live backend round-robin
//! - Apply passive status updates by endpoint

use std::sync::Arc;

use url::Url;

use crate::load_balancer::{backend::Backend, round_robin::RoundRobin};

/// The ordered set of backends plus the rotation cursor.
///
/// Backends are appended through `&mut self` while the pool is being built;
/// once it is shared behind an `Arc` the list can no longer change and only
/// each backend's liveness flag mutates.
#[derive(Debug, Default)]
pub struct ServerPool {
    backends: Vec<Arc<Backend>>,
    round_robin: RoundRobin,
}

impl ServerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a backend. Rotation order is insertion order.
    pub fn add_backend(&mut self, backend: Arc<Backend>) {
        self.backends.push(backend);
    }

    /// Advance the rotation cursor and return the resulting index.
    pub fn next_index(&self) -> usize {
        self.round_robin.next_index(self.backends.len())
    }

    /// Next alive backend in rotation order, or `None` on a full outage.
    pub fn get_next_peer(&self) -> Option<Arc<Backend>> {
        let peer = self.round_robin.next_live(&self.backends);
        if peer.is_none() {
            tracing::debug!(backend_count = self.backends.len(), "No live backends in pool");
            for b in &self.backends {
                tracing::debug!(backend = %b.url(), alive = b.is_alive(), "Backend status");
            }
        }
        peer
    }

    /// Set the liveness of the backend at `endpoint`; no-op if none matches.
    pub fn mark_backend_status(&self, endpoint: &Url, alive: bool) {
        if let Some(backend) = self.backends.iter().find(|b| b.url() == endpoint) {
            backend.set_alive(alive);
        }
    }

    /// All backends, in rotation order.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
