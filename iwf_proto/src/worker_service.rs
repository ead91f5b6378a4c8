//! Worker callback API.
//!
//! The iWF server drives a workflow by calling back into the worker that
//! hosts it: once to run a state's start phase and, when the requested
//! commands are ready, once to run its decide phase.

use iwf_core::EncodedObject;
use serde::{Deserialize, Serialize};

use crate::shared::*;

pub const WORKFLOW_STATE_START_API_PATH: &str = "/api/v1/workflowState/start";
pub const WORKFLOW_STATE_DECIDE_API_PATH: &str = "/api/v1/workflowState/decide";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStateStartRequest {
    pub context: Context,
    pub workflow_type: String,
    pub workflow_state_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_input: Option<EncodedObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_attributes: Option<Vec<SearchAttribute>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_attributes: Option<Vec<KeyValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStateStartResponse {
    pub command_request: CommandRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upsert_state_locals: Option<Vec<KeyValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_events: Option<Vec<KeyValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStateDecideRequest {
    pub context: Context,
    pub workflow_type: String,
    pub workflow_state_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_input: Option<EncodedObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_results: Option<CommandResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_locals: Option<Vec<KeyValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_attributes: Option<Vec<SearchAttribute>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_attributes: Option<Vec<KeyValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStateDecideResponse {
    pub state_decision: StateDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upsert_search_attributes: Option<Vec<SearchAttribute>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upsert_query_attributes: Option<Vec<KeyValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_events: Option<Vec<KeyValue>>,
}
