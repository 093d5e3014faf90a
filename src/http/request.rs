//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4)
//! - Buffer the inbound request so it can be replayed on retry
//! - Prepare the request for forwarding to a specific backend
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body size is bounded before buffering
//! - Original request kept intact; each attempt builds a fresh copy

use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use http_body_util::LengthLimitError;
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};
use url::{Position, Url};
use uuid::Uuid;

use crate::http::response::strip_hop_by_hop;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Generates a UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Why an inbound body could not be buffered.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Read(#[source] axum::Error),
}

impl BufferError {
    fn classify(error: axum::Error, limit: usize) -> Self {
        let over_limit = std::error::Error::source(&error)
            .is_some_and(|inner| inner.is::<LengthLimitError>());
        if over_limit {
            BufferError::TooLarge { limit }
        } else {
            BufferError::Read(error)
        }
    }
}

/// An inbound request buffered for (possibly repeated) forwarding.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    remote: Option<SocketAddr>,
}

impl ForwardRequest {
    /// Buffer an inbound request, reading at most `limit` body bytes.
    ///
    /// The client address is taken from axum's `ConnectInfo` extension when the
    /// server was started with connect info.
    pub async fn buffer(request: Request<Body>, limit: usize) -> Result<Self, BufferError> {
        let remote = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit)
            .await
            .map_err(|e| BufferError::classify(e, limit))?;

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            remote,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn remote(&self) -> Option<SocketAddr> {
        self.remote
    }

    /// Client address for log lines.
    pub fn remote_label(&self) -> String {
        self.remote
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn request_id(&self) -> &str {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }

    /// Build the outbound request for the backend rooted at `base`.
    ///
    /// The backend's path prefix and query are joined with the request's, `Host`
    /// is rewritten, hop-by-hop headers are dropped and the client IP is appended
    /// to `X-Forwarded-For`.
    pub fn to_upstream(&self, base: &Url) -> Result<Request<Body>, axum::http::Error> {
        let authority = &base[Position::BeforeHost..Position::AfterPort];
        let mut target = format!(
            "{}://{}{}",
            base.scheme(),
            authority,
            join_path(base.path(), self.uri.path())
        );
        if let Some(query) = join_query(base.query(), self.uri.query()) {
            target.push('?');
            target.push_str(&query);
        }

        let mut headers = self.headers.clone();
        strip_hop_by_hop(&mut headers);
        headers.insert(header::HOST, HeaderValue::from_str(authority)?);

        if let Some(remote) = self.remote {
            let client_ip = remote.ip().to_string();
            let prior: Vec<&str> = headers
                .get_all(&X_FORWARDED_FOR)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            let forwarded = if prior.is_empty() {
                client_ip
            } else {
                format!("{}, {}", prior.join(", "), client_ip)
            };
            headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(&forwarded)?);
        }

        let mut builder = Request::builder().method(self.method.clone()).uri(target);
        if let Some(outbound) = builder.headers_mut() {
            *outbound = headers;
        }
        builder.body(Body::from(self.body.clone()))
    }
}

fn join_path(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

fn join_query(base: Option<&str>, request: Option<&str>) -> Option<String> {
    match (
        base.filter(|q| !q.is_empty()),
        request.filter(|q| !q.is_empty()),
    ) {
        (Some(b), Some(r)) => Some(format!("{}&{}", b, r)),
        (Some(q), None) | (None, Some(q)) => Some(q.to_string()),
        (None, None) => None,
    }
}
