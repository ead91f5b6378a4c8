//! State decisions: where the workflow goes after a state's decide phase.

use iwf_core::DynValue;
use serde::{de::DeserializeOwned, Serialize};

use crate::state::StateOptions;

pub const GRACEFUL_COMPLETING_WORKFLOW_STATE_ID: &str = "_SYS_GRACEFUL_COMPLETING_WORKFLOW";
pub const FORCE_COMPLETING_WORKFLOW_STATE_ID: &str = "_SYS_FORCE_COMPLETING_WORKFLOW";
pub const FORCE_FAILING_WORKFLOW_STATE_ID: &str = "_SYS_FORCE_FAILING_WORKFLOW";
pub const DEAD_END_STATE_ID: &str = "_SYS_DEAD_END";

/// Transition to one state with its input
#[derive(Debug)]
pub struct StateMovement {
    pub state_id: String,
    pub input: Option<DynValue>,
    /// Overrides the options the target state was registered with
    pub options: Option<StateOptions>,
}

impl StateMovement {
    pub fn new(state_id: impl Into<String>) -> Self {
        Self {
            state_id: state_id.into(),
            input: None,
            options: None,
        }
    }

    pub fn with_input<T>(state_id: impl Into<String>, input: T) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            state_id: state_id.into(),
            input: Some(DynValue::new(input)),
            options: None,
        }
    }

    pub fn options(mut self, options: StateOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Whether this movement ends the thread it runs on
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state_id.as_str(),
            GRACEFUL_COMPLETING_WORKFLOW_STATE_ID
                | FORCE_COMPLETING_WORKFLOW_STATE_ID
                | FORCE_FAILING_WORKFLOW_STATE_ID
                | DEAD_END_STATE_ID
        )
    }
}

/// Ordered next states, or a terminal marker
#[derive(Debug)]
pub struct StateDecision {
    next_states: Vec<StateMovement>,
}

impl StateDecision {
    pub fn single_next_state(movement: StateMovement) -> Self {
        Self {
            next_states: vec![movement],
        }
    }

    /// Fan out to several states; they run in parallel
    pub fn multiple_next_states(movements: impl IntoIterator<Item = StateMovement>) -> Self {
        Self {
            next_states: movements.into_iter().collect(),
        }
    }

    /// Complete the workflow once every other thread has finished
    pub fn graceful_complete_workflow<T>(output: T) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self::single_next_state(StateMovement::with_input(
            GRACEFUL_COMPLETING_WORKFLOW_STATE_ID,
            output,
        ))
    }

    /// Complete the workflow now, even if other threads are running
    pub fn force_complete_workflow<T>(output: T) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self::single_next_state(StateMovement::with_input(
            FORCE_COMPLETING_WORKFLOW_STATE_ID,
            output,
        ))
    }

    pub fn force_fail_workflow<T>(output: T) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self::single_next_state(StateMovement::with_input(
            FORCE_FAILING_WORKFLOW_STATE_ID,
            output,
        ))
    }

    /// End this thread without completing the workflow
    pub fn dead_end() -> Self {
        Self::single_next_state(StateMovement::new(DEAD_END_STATE_ID))
    }

    pub fn next_states(&self) -> &[StateMovement] {
        &self.next_states
    }
}
