//! Workflow service interface.
//!
//! This module defines the request/response types of the iWF server API and
//! the [`WorkflowService`] trait the client uses to send them. The trait is
//! the seam between the client and the transport; the HTTP implementation
//! lives in the client crate and tests substitute a recording spy.

use async_trait::async_trait;
use iwf_core::{EncodedObject, TransportError};
use serde::{Deserialize, Serialize};

use crate::shared::*;

pub const WORKFLOW_START_API_PATH: &str = "/api/v1/workflow/start";
pub const WORKFLOW_SIGNAL_API_PATH: &str = "/api/v1/workflow/signal";
pub const WORKFLOW_GET_WITH_WAIT_API_PATH: &str = "/api/v1/workflow/getWithWait";
pub const WORKFLOW_RESET_API_PATH: &str = "/api/v1/workflow/reset";
pub const WORKFLOW_CANCEL_API_PATH: &str = "/api/v1/workflow/cancel";
pub const WORKFLOW_GET_QUERY_ATTRIBUTES_API_PATH: &str = "/api/v1/workflow/queryattributes/get";
pub const WORKFLOW_GET_SEARCH_ATTRIBUTES_API_PATH: &str = "/api/v1/workflow/searchattributes/get";
pub const WORKFLOW_SEARCH_API_PATH: &str = "/api/v1/workflow/search";

/// Workflow ID reuse policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdReusePolicy {
    AllowDuplicateFailedOnly,
    AllowDuplicate,
    RejectDuplicate,
    TerminateIfRunning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStartOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_reuse_policy: Option<IdReusePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_schedule: Option<String>,
}

/// Start workflow request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStartRequest {
    pub workflow_id: String,
    pub iwf_worker_url: String,
    pub iwf_workflow_type: String,
    pub workflow_timeout_seconds: i32,
    pub start_state_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_input: Option<EncodedObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_start_options: Option<WorkflowStartOptions>,
}

/// Start workflow response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStartResponse {
    pub workflow_run_id: String,
}

/// Signal workflow request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSignalRequest {
    pub workflow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<String>,
    pub signal_channel_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_value: Option<EncodedObject>,
}

/// Get workflow (with wait) request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGetRequest {
    pub workflow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<String>,
    pub needs_results: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
    Timeout,
    Terminated,
    Canceled,
    ContinuedAsNew,
}

/// Output of a state that completed the workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateCompletionOutput {
    pub completed_state_id: String,
    #[serde(default)]
    pub completed_state_execution_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_state_output: Option<EncodedObject>,
}

/// Get workflow (with wait) response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGetResponse {
    #[serde(default)]
    pub workflow_run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_status: Option<WorkflowStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<StateCompletionOutput>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResetType {
    HistoryEventId,
    Beginning,
    LastDecisionCompleted,
    LastContinuedAsNew,
    BadBinary,
    DecisionCompletedTime,
    FirstDecisionScheduled,
    LastDecisionScheduled,
}

/// Reset workflow request
///
/// Which optional fields are required depends on `reset_type`; the server
/// validates that, not the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResetRequest {
    pub workflow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<String>,
    pub reset_type: ResetType,
    /// Required for `HistoryEventId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_event_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Required for `BadBinary`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_bad_binary_checksum: Option<String>,
    /// Only negative offsets are supported, together with `LastDecisionCompleted`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_offset: Option<i32>,
    /// Required for `DecisionCompletedTime`, e.g. `2006-01-02T15:04:05+07:00` or `15m`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_signal_reapply: Option<bool>,
}

/// Reset workflow response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResetResponse {
    pub workflow_run_id: String,
}

/// Cancel workflow request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowCancelRequest {
    pub workflow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<String>,
}

/// Get query attributes request; no keys means all keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGetQueryAttributesRequest {
    pub workflow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_keys: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGetQueryAttributesResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_attributes: Option<Vec<KeyValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGetSearchAttributesRequest {
    pub workflow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<String>,
    pub attribute_keys: Vec<SearchAttributeKeyAndType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGetSearchAttributesResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_attributes: Option<Vec<SearchAttribute>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSearchRequest {
    pub query: String,
    pub page_size: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSearchResponseEntry {
    pub workflow_id: String,
    pub workflow_run_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSearchResponse {
    #[serde(default)]
    pub workflow_executions: Vec<WorkflowSearchResponseEntry>,
}

/// Remote calls understood by the iWF server
#[async_trait]
pub trait WorkflowService: Send + Sync {
    async fn start_workflow(
        &self,
        request: WorkflowStartRequest,
    ) -> Result<WorkflowStartResponse, TransportError>;

    async fn signal_workflow(&self, request: WorkflowSignalRequest) -> Result<(), TransportError>;

    /// Long poll until the workflow closes
    async fn get_workflow_with_wait(
        &self,
        request: WorkflowGetRequest,
    ) -> Result<WorkflowGetResponse, TransportError>;

    async fn reset_workflow(
        &self,
        request: WorkflowResetRequest,
    ) -> Result<WorkflowResetResponse, TransportError>;

    async fn cancel_workflow(&self, request: WorkflowCancelRequest) -> Result<(), TransportError>;

    async fn get_query_attributes(
        &self,
        request: WorkflowGetQueryAttributesRequest,
    ) -> Result<WorkflowGetQueryAttributesResponse, TransportError>;

    async fn get_search_attributes(
        &self,
        request: WorkflowGetSearchAttributesRequest,
    ) -> Result<WorkflowGetSearchAttributesResponse, TransportError>;

    async fn search_workflow(
        &self,
        request: WorkflowSearchRequest,
    ) -> Result<WorkflowSearchResponse, TransportError>;
}
