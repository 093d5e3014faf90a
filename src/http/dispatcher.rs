//! Request dispatch: routing, forwarding, retry and failover.
//!
//! # State Machine
//! ```text
//! ROUTING ──attempts > max──────────────▶ UNAVAILABLE (503)
//!    │    ──no live backend─────────────▶ UNAVAILABLE (503)
//!    ▼
//! FORWARDING ──ok──▶ SUCCESS (stream response)
//!    │  ▲
//!    │  └── RETRYING (same backend, after delay)
//!    ▼
//! FAILOVER (mark backend down, attempts += 1) ──▶ ROUTING
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::http::Response;
use axum::response::IntoResponse;
use thiserror::Error;

use crate::http::request::ForwardRequest;
use crate::http::response;
use crate::load_balancer::{Backend, ServerPool};
use crate::resilience::{FailoverController, Recovery, RequestBudget, RetryPolicy};

/// Terminal failure for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("max attempts reached ({max_attempts} backends tried)")]
    AttemptsExhausted { max_attempts: u32 },

    #[error("no live backend available")]
    NoLivePeer,
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> axum::response::Response {
        response::service_unavailable()
    }
}

enum State {
    Routing(RequestBudget),
    Forwarding(Arc<Backend>, RequestBudget),
}

/// Entry point for every proxied request.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    pool: Arc<ServerPool>,
    policy: RetryPolicy,
    controller: FailoverController,
}

impl Dispatcher {
    pub fn new(pool: Arc<ServerPool>, policy: RetryPolicy) -> Self {
        let controller = FailoverController::new(pool.clone(), policy);
        Self {
            pool,
            policy,
            controller,
        }
    }

    pub fn pool(&self) -> &Arc<ServerPool> {
        &self.pool
    }

    /// Drive `request` to a backend response or a terminal error.
    pub async fn dispatch(&self, request: &ForwardRequest) -> Result<Response<Body>, DispatchError> {
        let mut state = State::Routing(RequestBudget::default());

        loop {
            state = match state {
                State::Routing(budget) => {
                    if !self.policy.allows_attempt(budget) {
                        tracing::warn!(
                            request_id = %request.request_id(),
                            remote = %request.remote_label(),
                            path = %request.path(),
                            "Max attempts reached, terminating"
                        );
                        return Err(DispatchError::AttemptsExhausted {
                            max_attempts: self.policy.max_attempts,
                        });
                    }

                    match self.pool.get_next_peer() {
                        Some(backend) => State::Forwarding(backend, budget),
                        None => {
                            tracing::warn!(
                                request_id = %request.request_id(),
                                remote = %request.remote_label(),
                                path = %request.path(),
                                "No live backends"
                            );
                            return Err(DispatchError::NoLivePeer);
                        }
                    }
                }
                State::Forwarding(backend, budget) => match backend.forward(request).await {
                    Ok(response) => {
                        tracing::debug!(
                            request_id = %request.request_id(),
                            backend = %backend.address(),
                            status = %response.status(),
                            attempt = budget.attempts(),
                            retry = budget.retries(),
                            "Forwarded"
                        );
                        return Ok(response);
                    }
                    Err(error) => {
                        match self
                            .controller
                            .handle_failure(&backend, budget, request, &error)
                            .await
                        {
                            Recovery::Retry(next) => State::Forwarding(backend, next),
                            Recovery::Failover(next) => State::Routing(next),
                        }
                    }
                },
            };
        }
    }
}
