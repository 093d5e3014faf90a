//! Response handling and transformation.
//!
//! # Responsibilities
//! - Transform backend responses for the client
//! - Strip hop-by-hop headers in both directions
//! - Build the fixed service-unavailable response
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the entire body
//! - Hop-by-hop headers stripped automatically

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Response, StatusCode};
use axum::response::IntoResponse;
use hyper::body::Incoming;

/// Body returned when no backend could serve a request.
pub const SERVICE_NOT_AVAILABLE: &str = "Service not available";

const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(*name);
    }
}

/// Convert a backend response into a client response, streaming the body.
pub fn from_upstream(response: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// `503 Service Unavailable` with a plain-text body.
pub fn service_unavailable() -> Response<Body> {
    (StatusCode::SERVICE_UNAVAILABLE, SERVICE_NOT_AVAILABLE).into_response()
}

/// `413 Payload Too Large` for bodies over the buffering limit.
pub fn payload_too_large() -> Response<Body> {
    (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
}


/// `400 Bad Request` when the request body could not be read.
pub fn bad_request() -> Response<Body> {
    (StatusCode::BAD_REQUEST, "Failed to read request body").into_response()
}
