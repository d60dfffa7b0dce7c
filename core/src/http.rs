//! HTTP transport types and the transport seam.
//!
//! # Design
//! `HttpRequest` and `HttpResponse` describe HTTP traffic as plain data. The
//! core builds requests and parses responses without ever touching the
//! network; actual I/O happens behind the [`Transport`] trait, which is the
//! only blocking point in the whole system. Production callers plug in a real
//! HTTP agent, tests plug in scripted transports.
//!
//! All fields use owned types (`String`, `Vec`) so values can be moved freely
//! between the client and transport implementations.

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// An HTTP request described as plain data.
///
/// Built by the client's `build_*` helpers and handed to a [`Transport`] for
/// execution.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Produced by a [`Transport`], then passed to the client's `parse_*` helpers
/// for status interpretation and deserialization.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Executes one HTTP round-trip on behalf of the client.
///
/// Implementations run the request synchronously and return the response
/// whatever its status code; status interpretation belongs to the client.
/// Network-level failures map to [`ApiError::Transport`] and are never
/// retried at this layer.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}
