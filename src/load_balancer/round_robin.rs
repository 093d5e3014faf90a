//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::load_balancer::backend::Backend;

/// Round-robin selector.
/// Stores the rotation cursor; the active index is `cursor % len`.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicU64,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cursor and return the position it pointed at, modulo `len`.
    ///
    /// `fetch_add` wraps on overflow; only the modulo is ever observed.
    pub fn next_index(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.cursor.fetch_add(1, Ordering::Relaxed) % len as u64) as usize
    }

    /// Pick the first alive backend at or after the next cursor position.
    ///
    /// When the pick had to skip dead entries, the cursor is moved to just past
    /// the pick so the following selection does not walk the same dead entries
    /// again. That store races with concurrent selections; a lost or duplicated
    /// update only changes which live backend is picked next.
    pub fn next_live(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        let len = backends.len();
        if len == 0 {
            return None;
        }

        let start = self.next_index(len);
        for offset in 0..len {
            let index = (start + offset) % len;
            let backend = &backends[index];
            if backend.is_alive() {
                if offset != 0 {
                    self.cursor.store(index as u64 + 1, Ordering::Relaxed);
                }
                return Some(backend.clone());
            }
        }
        None
    }
}
