//! Error types shared by every layer of the iWF client.
//!
//! Encoding failures live next to the encoder in [`crate::encoded`]; this
//! module holds the transport-level errors raised while talking to the iWF
//! server.

use std::time::Duration;
use thiserror::Error;

/// Transport-layer errors for HTTP communication with the iWF server.
///
/// These errors represent network-level failures and non-success responses.
/// The HTTP status code and body are preserved so callers can match on them
/// and decide whether to retry.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the response could not be read
    #[error("Request to {endpoint} failed: {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Invalid endpoint URL provided
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Non-success HTTP status returned by the server
    #[error("HTTP error [{status}] from {endpoint}: {body}")]
    HttpStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Response body was not the expected JSON shape
    #[error("Malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    /// Request timed out
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Create a request failed error for a specific endpoint
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        TransportError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Check if this error is retryable (transient failure)
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::HttpStatus { status, .. } => {
                matches!(status, 429 | 502 | 503 | 504)
            }
            TransportError::Timeout(_) => true,
            TransportError::RequestFailed { source, .. } => {
                source.is_connect() || source.is_timeout()
            }
            _ => false,
        }
    }

    /// Get the HTTP status code if the server answered
    pub fn http_status(&self) -> Option<u16> {
        match self {
            TransportError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
