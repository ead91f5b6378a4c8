//! Error types for workflow definitions and state execution.

use iwf_core::EncodingError;
use thiserror::Error;

/// A definition collides with one that is already registered.
///
/// Raised by [`crate::Registry::add_workflow`]; the registry is left exactly
/// as it was before the failing call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionConflictError {
    #[error("Workflow type {0} is already registered")]
    WorkflowType(String),

    #[error("State {state_id} of workflow {workflow_type} is already registered")]
    State {
        workflow_type: String,
        state_id: String,
    },

    #[error("Signal channel {name} is declared twice in workflow {workflow_type}")]
    SignalChannel { workflow_type: String, name: String },

    #[error("Query attribute {key} is declared twice in workflow {workflow_type}")]
    QueryAttribute { workflow_type: String, key: String },

    #[error("Search attribute {key} is declared twice in workflow {workflow_type}")]
    SearchAttribute { workflow_type: String, key: String },

    #[error("Inter-state channel {name} is declared twice in workflow {workflow_type}")]
    InterStateChannel { workflow_type: String, name: String },

    #[error("Long running activity {activity_type} is declared twice in workflow {workflow_type}")]
    LongRunningActivity {
        workflow_type: String,
        activity_type: String,
    },
}

/// Misuse of query/search attributes or state locals from state code
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    #[error("{kind} attribute {key} is not declared")]
    UnknownKey { kind: &'static str, key: String },

    #[error("Attribute {key} holds {expected}, not {actual}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Event {0} was already recorded")]
    DuplicateEvent(String),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl AttributeError {
    pub(crate) fn unknown_query(key: impl Into<String>) -> Self {
        AttributeError::UnknownKey {
            kind: "Query",
            key: key.into(),
        }
    }

    pub(crate) fn unknown_search(key: impl Into<String>) -> Self {
        AttributeError::UnknownKey {
            kind: "Search",
            key: key.into(),
        }
    }
}

/// Failure raised by a state's start or decide phase
#[derive(Debug, Error)]
pub enum StateError {
    /// The state input was not of the state's declared input type
    #[error("State {state_id} expects input {expected}, got {actual}")]
    InputType {
        state_id: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Application failure reported by state code
    #[error("State failed: {0}")]
    Failed(String),
}

impl StateError {
    pub fn failed(message: impl Into<String>) -> Self {
        StateError::Failed(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_messages_name_the_duplicate() {
        let err = DefinitionConflictError::State {
            workflow_type: "OrderWorkflow".to_string(),
            state_id: "Created".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "State Created of workflow OrderWorkflow is already registered"
        );
    }

    #[test]
    fn test_attribute_error_converts_into_state_error() {
        let err: StateError = AttributeError::unknown_query("customer").into();
        assert!(matches!(
            err,
            StateError::Attribute(AttributeError::UnknownKey { kind: "Query", .. })
        ));
    }
}
