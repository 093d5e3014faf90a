//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (buffer body, capture client address)
//!     → dispatcher.rs (route, forward, retry, fail over)
//!     → response.rs (strip hop-by-hop headers, or 503)
//!     → Send to client
//! ```

pub mod dispatcher;
pub mod request;
pub mod response;
pub mod server;

pub use dispatcher::{DispatchError, Dispatcher};
pub use request::{BufferError, ForwardRequest, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
