//! Core types and utilities for the iWF client.
//!
//! This crate provides the foundational error types, the pluggable object
//! encoder, and the runtime type descriptors used to recover the type of a
//! value that travels untyped over the wire.

pub mod encoded;
pub mod error;
pub mod types;

pub use encoded::*;
pub use error::*;
pub use types::*;
