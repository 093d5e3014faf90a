//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener
//! - Hand every request to the dispatcher
//! - Run the active health monitor alongside the server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{HealthCheckConfig, LbConfig};
use crate::health::HealthMonitor;
use crate::http::dispatcher::Dispatcher;
use crate::http::request::{BufferError, ForwardRequest, UuidRequestId};
use crate::http::response;
use crate::load_balancer::ServerPool;
use crate::resilience::RetryPolicy;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_bytes: usize,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    pool: Arc<ServerPool>,
    health_check: HealthCheckConfig,
}

impl HttpServer {
    /// Create a new HTTP server over an already-built pool.
    pub fn new(config: &LbConfig, pool: Arc<ServerPool>) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(
            pool.clone(),
            RetryPolicy::from(&config.retries),
        ));

        let state = AppState {
            dispatcher,
            max_body_bytes: config.upstream.max_body_bytes,
        };

        Self {
            router: Self::build_router(state),
            pool,
            health_check: config.health_check.clone(),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.pool.len(),
            "Load balancer started"
        );

        let monitor = HealthMonitor::from_config(self.pool.clone(), &self.health_check);
        let monitor_task = tokio::spawn(monitor.run(shutdown.resubscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        if let Err(e) = monitor_task.await {
            tracing::error!(error = %e, "Health monitor task failed");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Buffers the request and hands it to the dispatcher.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request = match ForwardRequest::buffer(request, state.max_body_bytes).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            return match e {
                BufferError::TooLarge { .. } => response::payload_too_large(),
                BufferError::Read(_) => response::bad_request(),
            };
        }
    };

    tracing::debug!(
        request_id = %request.request_id(),
        method = %request.method(),
        path = %request.path(),
        remote = %request.remote_label(),
        "Proxying request"
    );

    match state.dispatcher.dispatch(&request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}
