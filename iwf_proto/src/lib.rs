//! Protocol definitions for the iWF client.
//!
//! This crate contains the JSON request/response shapes of the iWF server API
//! (used by the client) and of the worker callback API (used when the server
//! asks a worker to run a state's start or decide phase). Field names follow
//! the server's camelCase contract.

pub mod shared;
pub mod worker_service;
pub mod workflow_service;

pub use iwf_core::EncodedObject;
pub use shared::*;
pub use worker_service::*;
pub use workflow_service::*;
