//! Forwarding capability bound to a single backend.
//!
//! # Responsibilities
//! - Send a buffered request to one endpoint and hand back the response
//! - Enforce connect and response-header timeouts
//! - Report transport failures as `ForwardError` instead of client responses

use std::time::Duration;

use axum::body::Body;
use axum::http::Response;
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::time;
use url::Url;

use crate::http::request::ForwardRequest;
use crate::http::response;

/// Shared HTTP client used by every `HttpUpstream`.
pub type HttpClient = Client<HttpConnector, Body>;

/// A transport-level failure while forwarding to a backend.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

/// Something able to stream a request to one backend.
pub trait Upstream: Send + Sync {
    fn forward<'a>(
        &'a self,
        request: &'a ForwardRequest,
    ) -> BoxFuture<'a, Result<Response<Body>, ForwardError>>;
}

/// Build the pooled client shared by all backends.
pub fn build_client(connect_timeout: Duration) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(connect_timeout));
    Client::builder(TokioExecutor::new()).build(connector)
}

/// HTTP forwarding to a fixed base URL.
#[derive(Clone)]
pub struct HttpUpstream {
    client: HttpClient,
    base: Url,
    request_timeout: Duration,
}

impl HttpUpstream {
    pub fn new(client: HttpClient, base: Url, request_timeout: Duration) -> Self {
        Self {
            client,
            base,
            request_timeout,
        }
    }
}

impl Upstream for HttpUpstream {
    fn forward<'a>(
        &'a self,
        request: &'a ForwardRequest,
    ) -> BoxFuture<'a, Result<Response<Body>, ForwardError>> {
        Box::pin(async move {
            let outbound = request.to_upstream(&self.base)?;
            match time::timeout(self.request_timeout, self.client.request(outbound)).await {
                Ok(Ok(upstream_response)) => Ok(response::from_upstream(upstream_response)),
                Ok(Err(e)) => Err(ForwardError::Transport(e)),
                Err(_) => Err(ForwardError::Timeout(self.request_timeout)),
            }
        })
    }
}
