//! # iwf - Rust SDK for iWF
//!
//! This is a meta-crate that re-exports all iWF crates for convenient access.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! iwf = "0.1.0"
//! ```
//!
//! Then use the crates like this:
//!
//! ```rust,no_run
//! use iwf::client::{Client, ClientOptions};
//! use iwf::core::{EncodedObject, JsonObjectEncoder};
//! use iwf::worker::{WorkerOptions, WorkerService};
//! use iwf::workflow::{Registry, StateDecision, Workflow, WorkflowState};
//! ```
//!
//! ## Re-exported Crates
//!
//! - [`proto`] - Wire types of the server and worker APIs
//! - [`core`] - Encoding, type descriptors and transport errors
//! - [`workflow`] - Workflow authoring model and registry
//! - [`client`] - Typed and untyped clients
//! - [`worker`] - State callback dispatch and its HTTP router
//! - [`testsuite`] - Testing utilities

pub use iwf_client as client;
pub use iwf_core as core;
pub use iwf_proto as proto;
pub use iwf_testsuite as testsuite;
pub use iwf_worker as worker;
pub use iwf_workflow as workflow;
pub use serde_json;
