//! Error types for the Hevy API client.
//!
//! # Design
//! Every non-2xx response lands in `Http` with the status, status text, raw
//! body and resolved URL; the client never interprets the body further.
//! "Not found" is not its own variant: callers ask `is_not_found()` instead,
//! so every status travels the same path. Transport failures keep the
//! original error as their `source`.

use thiserror::Error;

use crate::http::{HttpResponse, TransportError};

/// Errors returned by `HevyClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a status outside 200..=299.
    #[error("{status} {status_text}: {body} ({url})")]
    Http {
        status: u16,
        status_text: String,
        body: String,
        url: String,
    },

    /// A success response whose body is not the expected JSON.
    #[error("failed to parse response body: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request payload could not be serialized to JSON.
    #[error("failed to serialize request body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The query parameters could not be encoded.
    #[error("failed to encode query string: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),

    /// No response was received.
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: TransportError,
    },
}

impl ApiError {
    pub(crate) fn from_response(response: HttpResponse) -> Self {
        ApiError::Http {
            status: response.status,
            status_text: response.status_text,
            body: response.body,
            url: response.url,
        }
    }

    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
