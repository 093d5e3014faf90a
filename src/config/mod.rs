//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LbConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; the backend list never changes afterwards
//! - All fields except `backends` have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigFormat};
pub use schema::{HealthCheckConfig, LbConfig, RetryConfig, UpstreamConfig};
pub use validation::ValidationError;
