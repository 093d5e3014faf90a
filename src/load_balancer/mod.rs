//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher asks for a peer
//!     → pool.rs (ordered backend list)
//!     → round_robin.rs (rotate, skipping backends that are down)
//!     → backend.rs (liveness + forward)
//!     → upstream.rs (HTTP client bound to the backend URL)
//! ```
//!
//! # Design Decisions
//! - Backend list fixed after startup; only liveness changes while serving
//! - Down backends excluded from selection
//! - One pooled HTTP client shared by every backend

pub mod backend;
pub mod pool;
pub mod round_robin;
pub mod upstream;

pub use backend::{Backend, EndpointError};
pub use pool::ServerPool;
pub use upstream::{ForwardError, HttpUpstream, Upstream};
