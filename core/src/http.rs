//! HTTP transport types and the default network transport.
//!
//! # Design
//! `HttpRequest` and `HttpResponse` describe an exchange as plain data. The
//! client builds requests and parses responses without touching the network;
//! a `Transport` executes the round-trip in between. `UreqTransport` is the
//! default, and tests swap in a recording transport or a real mock server.
//!
//! All fields use owned types (`String`, `Vec`) so requests can be inspected,
//! cloned and replayed freely.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use tracing::warn;

/// Placeholder used when the body of an error response cannot be read.
pub const UNREADABLE_BODY: &str = "Unable to read error response body";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `HevyClient::build_*` methods with the client's fixed headers
/// already merged in. `url` is fully resolved: base URL, path and query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Set a header, replacing any existing header with the same name
    /// (compared case-insensitively).
    pub fn header(mut self, name: &str, value: &str) -> Self {
        merge_header(&mut self.headers, name, value);
        self
    }

    /// Look up a header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// `url` is the resolved URL of the request that produced it, kept so
/// errors can report where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        is_success(self.status)
    }
}

pub(crate) fn is_success(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Insert or replace `name` in `headers`, keeping the original position of a
/// replaced header.
pub(crate) fn merge_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
        Some(existing) => *existing = (name.to_string(), value.to_string()),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

/// Error produced by a transport. Kept boxed so the original error reaches
/// the caller untouched through `ApiError::Network`'s source.
pub type TransportError = Box<dyn Error + Send + Sync>;

/// Executes one HTTP round-trip.
///
/// Implementations must return non-2xx responses as `Ok` so the client can
/// apply its own status handling. `Err` is reserved for failures where no
/// response was received (DNS, refused connection, timeout).
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Resolve the body of a response whose read may have failed.
///
/// Error responses get a placeholder so the primary status error is never
/// masked; a read failure on a success response is still a failure.
pub(crate) fn resolve_body<E>(status: u16, read: Result<String, E>) -> Result<String, E>
where
    E: fmt::Display,
{
    match read {
        Ok(body) => Ok(body),
        Err(err) if !is_success(status) => {
            warn!(status, error = %err, "failed to read error response body");
            Ok(UNREADABLE_BODY.to_string())
        }
        Err(err) => Err(err),
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Build an agent that returns 4xx/5xx responses as data, with an
    /// optional global timeout covering the whole call.
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = resolve_body(status.as_u16(), response.body_mut().read_to_string())?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            url: request.url.clone(),
            headers,
            body,
        })
    }
}
