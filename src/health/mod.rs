//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each backend over TCP (probe.rs)
//!     → Backend::set_alive
//!
//! Passive health checks (resilience::failover):
//!     Retries against a backend exhausted
//!     → ServerPool::mark_backend_status(backend, false)
//! ```
//!
//! # Design Decisions
//! - Active and passive checks are complementary
//! - One probe result flips liveness; no hysteresis
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod probe;

pub use active::HealthMonitor;
pub use probe::{probe_tcp, ProbeFailure};
