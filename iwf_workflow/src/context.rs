//! Execution context handed to state code.

use iwf_proto::shared as wire;

/// Identity of the workflow run and state execution being served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub workflow_id: String,
    pub workflow_run_id: String,
    /// Unix seconds
    pub workflow_start_timestamp: i64,
    /// Absent while the workflow is being started
    pub state_execution_id: Option<String>,
    pub attempt: Option<i32>,
    /// Unix seconds
    pub first_attempt_timestamp: Option<i64>,
}

impl Context {
    pub fn new(
        workflow_id: impl Into<String>,
        workflow_run_id: impl Into<String>,
        workflow_start_timestamp: i64,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            workflow_run_id: workflow_run_id.into(),
            workflow_start_timestamp,
            state_execution_id: None,
            attempt: None,
            first_attempt_timestamp: None,
        }
    }
}

impl From<wire::Context> for Context {
    fn from(context: wire::Context) -> Self {
        Self {
            workflow_id: context.workflow_id,
            workflow_run_id: context.workflow_run_id,
            workflow_start_timestamp: context.workflow_started_timestamp,
            state_execution_id: context.state_execution_id,
            attempt: context.attempt,
            first_attempt_timestamp: context.first_attempt_timestamp,
        }
    }
}
