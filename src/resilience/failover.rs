//! Failure handling for a single forwarding attempt.
//!
//! # State Transitions
//! ```text
//! forward failed, retries < max_retries  → wait retry_delay → retry same backend
//! forward failed, retries == max_retries → mark backend down → route to another backend
//! ```

use std::sync::Arc;

use tokio::time;

use crate::http::request::ForwardRequest;
use crate::load_balancer::{Backend, ForwardError, ServerPool};
use crate::resilience::retries::{RequestBudget, RetryPolicy};

/// What the dispatcher should do after a failed forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Forward again to the same backend with this budget.
    Retry(RequestBudget),
    /// The backend has been marked down; route again with this budget.
    Failover(RequestBudget),
}

/// Turns forwarding failures into retry or failover decisions.
#[derive(Debug, Clone)]
pub struct FailoverController {
    pool: Arc<ServerPool>,
    policy: RetryPolicy,
}

impl FailoverController {
    pub fn new(pool: Arc<ServerPool>, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    /// Handle a failed forward of `request` to `backend`.
    ///
    /// Sleeps for the retry delay before returning `Recovery::Retry`. Once the
    /// retry budget is spent the backend is passively marked down.
    pub async fn handle_failure(
        &self,
        backend: &Backend,
        budget: RequestBudget,
        request: &ForwardRequest,
        error: &ForwardError,
    ) -> Recovery {
        tracing::warn!(
            request_id = %request.request_id(),
            backend = %backend.address(),
            remote = %request.remote_label(),
            path = %request.path(),
            retry = budget.retries(),
            error = %error,
            "Upstream error"
        );

        if self.policy.allows_retry(budget) {
            let next = budget.next_retry();
            tracing::info!(
                request_id = %request.request_id(),
                backend = %backend.address(),
                remote = %request.remote_label(),
                path = %request.path(),
                retry = next.retries(),
                "Retrying same backend"
            );
            time::sleep(self.policy.retry_delay).await;
            return Recovery::Retry(next);
        }

        self.pool.mark_backend_status(backend.url(), false);

        let next = budget.next_attempt();
        tracing::info!(
            request_id = %request.request_id(),
            remote = %request.remote_label(),
            path = %request.path(),
            attempt = budget.attempts(),
            "Attempting retry on another backend"
        );
        Recovery::Failover(next)
    }
}
