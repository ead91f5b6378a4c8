//! Client-layer error type.

use iwf_core::EncodingError;
use thiserror::Error;

use super::{TransportError, ValidationError};

/// Errors returned by [`crate::Client`] and [`crate::UntypedClient`].
///
/// # Examples
///
/// ```no_run
/// use iwf_client::error::{ClientError, ValidationError};
///
/// fn describe(error: &ClientError) -> String {
///     match error {
///         ClientError::Validation(ValidationError::SignalTypeMismatch { channel, .. }) => {
///             format!("wrong value type for {}", channel)
///         }
///         ClientError::Transport(err) if err.is_retryable() => "try again".to_string(),
///         e if e.is_server_contract_violation() => format!("server bug: {}", e),
///         e => e.to_string(),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum ClientError {
    /// The call does not match the registry; nothing was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server answered with a shape it must never send
    #[error("Server contract violation: {0}")]
    ServerContractViolation(String),

    /// A single result was requested but the workflow completed with several
    #[error("Expected at most one completion output, got {0}")]
    MultipleResults(usize),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl ClientError {
    pub fn server_contract_violation(message: impl Into<String>) -> Self {
        ClientError::ServerContractViolation(message.into())
    }

    /// Whether the server's response broke the API contract
    pub fn is_server_contract_violation(&self) -> bool {
        matches!(
            self,
            ClientError::ServerContractViolation(_) | ClientError::MultipleResults(_)
        )
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
