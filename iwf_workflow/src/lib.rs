//! Workflow authoring model for iWF.
//!
//! Workflows are explicit state machines. Each [`WorkflowState`] requests
//! commands in `start` and picks the next states in `decide`; the iWF server
//! persists progress between the two. Definitions are collected in a
//! [`Registry`], which the client uses to validate calls and the worker uses
//! to dispatch server callbacks.

pub mod attributes;
pub mod command;
pub mod context;
pub mod decision;
pub mod definition;
pub mod error;
pub mod mapper;
pub mod registry;
pub mod state;

pub use attributes::{Attributes, QueryAttributes, SearchAttributes, StateLocals};
pub use command::*;
pub use context::Context;
pub use decision::*;
pub use definition::*;
pub use error::{AttributeError, DefinitionConflictError, StateError};
pub use registry::Registry;
pub use state::*;
