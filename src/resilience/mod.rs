//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Forward to backend fails:
//!     → failover.rs (retry same backend or mark it down)
//!     → retries.rs (per-request budget and limits)
//! ```
//!
//! # Design Decisions
//! - Every request gets a bounded number of backends and retries
//! - Transport errors are absorbed; the client only ever sees success or 503

pub mod failover;
pub mod retries;

pub use failover::{FailoverController, Recovery};
pub use retries::{RequestBudget, RetryPolicy};
