//! Validation failures raised before a request leaves the process.

use thiserror::Error;

/// A client call that does not match the registered workflow definitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Workflow {0} is not registered")]
    UnregisteredWorkflow(String),

    /// The state is unknown or is not allowed to start the workflow
    #[error("Invalid start state {state_id} for workflow {workflow_type}")]
    InvalidStartState {
        workflow_type: String,
        state_id: String,
    },

    #[error("State {state_id} expects input {expected}, got {actual}")]
    StateInputTypeMismatch {
        state_id: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Workflow {workflow_type} doesn't have signal channel {channel}")]
    UnknownSignalChannel {
        workflow_type: String,
        channel: String,
    },

    #[error("Signal value for channel {channel} is not of type {expected}")]
    SignalTypeMismatch {
        channel: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// The scoped attribute getters need at least one key
    #[error("Attribute keys must contain at least one entry, or use the get-all API")]
    EmptyAttributeKeys,

    #[error("{kind} attributes not registered: {}", .keys.join(", "))]
    UnknownAttributeKeys {
        kind: &'static str,
        keys: Vec<String>,
    },
}
