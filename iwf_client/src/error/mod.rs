//! Error types for the iWF client.
//!
//! - [`TransportError`]: HTTP and network-level failures (re-exported from core)
//! - [`ValidationError`]: caller mistakes caught against the registry before
//!   any request is sent
//! - [`ClientError`]: everything a client operation can fail with
//!
//! # Error Hierarchy
//!
//! ```text
//! TransportError (HTTP/network)    ValidationError (registry checks)
//!              ↘                      ↙
//!                     ClientError
//! ```

pub mod client;
pub mod validation;

pub use client::{ClientError, ClientResult};
pub use iwf_core::{EncodingError, TransportError};
pub use validation::ValidationError;
