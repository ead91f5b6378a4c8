//! Clients for the iWF server.
//!
//! [`Client`] validates every call against a [`iwf_workflow::Registry`]
//! before sending it; [`UntypedClient`] sends already-encoded payloads as-is.
//! Both sit on top of the [`iwf_proto::WorkflowService`] seam, implemented
//! over HTTP by [`HttpWorkflowService`].

pub mod client;
pub mod error;
pub mod http;
pub mod options;
pub mod untyped;

pub use client::Client;
pub use error::{ClientError, ClientResult, ValidationError};
pub use http::HttpWorkflowService;
pub use options::*;
pub use untyped::UntypedClient;
