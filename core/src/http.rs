//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! `DbClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network; the host executes the round-trip. Every
//! call to the `db` service is a `POST` to the JSON-RPC endpoint, so only that
//! method is modelled.
//!
//! All fields use owned types so values can cross the FFI boundary without
//! lifetime concerns.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `DbClient::build_*` methods. `url` is absolute (base URL joined
/// with the endpoint path).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// An HTTP response described as plain data.
///
/// Constructed by the caller after executing an `HttpRequest`, then passed
/// to `DbClient::parse_*` methods.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}
