//! In-memory stand-in for the iWF server.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use iwf_core::TransportError;
use iwf_proto::workflow_service::*;

/// A request received by [`MockWorkflowService`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    StartWorkflow(WorkflowStartRequest),
    SignalWorkflow(WorkflowSignalRequest),
    GetWorkflowWithWait(WorkflowGetRequest),
    ResetWorkflow(WorkflowResetRequest),
    CancelWorkflow(WorkflowCancelRequest),
    GetQueryAttributes(WorkflowGetQueryAttributesRequest),
    GetSearchAttributes(WorkflowGetSearchAttributesRequest),
    SearchWorkflow(WorkflowSearchRequest),
}

pub const MOCK_RUN_ID: &str = "mock-run-id";

type Scripted<T> = Mutex<VecDeque<Result<T, TransportError>>>;

/// Records every call and answers from per-operation queues of scripted
/// responses. An operation with nothing scripted answers with a benign
/// default: run id [`MOCK_RUN_ID`], no results, empty attribute lists.
#[derive(Default)]
pub struct MockWorkflowService {
    calls: Mutex<Vec<RecordedCall>>,
    start: Scripted<WorkflowStartResponse>,
    signal: Scripted<()>,
    get: Scripted<WorkflowGetResponse>,
    reset: Scripted<WorkflowResetResponse>,
    cancel: Scripted<()>,
    query_attributes: Scripted<WorkflowGetQueryAttributesResponse>,
    search_attributes: Scripted<WorkflowGetSearchAttributesResponse>,
    search: Scripted<WorkflowSearchResponse>,
}

fn push<T>(queue: &Scripted<T>, response: Result<T, TransportError>) {
    queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .push_back(response);
}

fn pop<T>(queue: &Scripted<T>) -> Option<Result<T, TransportError>> {
    queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .pop_front()
}

impl MockWorkflowService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn script_start_workflow(&self, response: Result<WorkflowStartResponse, TransportError>) {
        push(&self.start, response);
    }

    pub fn script_signal_workflow(&self, response: Result<(), TransportError>) {
        push(&self.signal, response);
    }

    pub fn script_get_workflow_with_wait(
        &self,
        response: Result<WorkflowGetResponse, TransportError>,
    ) {
        push(&self.get, response);
    }

    pub fn script_reset_workflow(&self, response: Result<WorkflowResetResponse, TransportError>) {
        push(&self.reset, response);
    }

    pub fn script_cancel_workflow(&self, response: Result<(), TransportError>) {
        push(&self.cancel, response);
    }

    pub fn script_get_query_attributes(
        &self,
        response: Result<WorkflowGetQueryAttributesResponse, TransportError>,
    ) {
        push(&self.query_attributes, response);
    }

    pub fn script_get_search_attributes(
        &self,
        response: Result<WorkflowGetSearchAttributesResponse, TransportError>,
    ) {
        push(&self.search_attributes, response);
    }

    pub fn script_search_workflow(&self, response: Result<WorkflowSearchResponse, TransportError>) {
        push(&self.search, response);
    }

    fn record(&self, call: RecordedCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }
}

#[async_trait]
impl WorkflowService for MockWorkflowService {
    async fn start_workflow(
        &self,
        request: WorkflowStartRequest,
    ) -> Result<WorkflowStartResponse, TransportError> {
        self.record(RecordedCall::StartWorkflow(request));
        pop(&self.start).unwrap_or_else(|| {
            Ok(WorkflowStartResponse {
                workflow_run_id: MOCK_RUN_ID.to_string(),
            })
        })
    }

    async fn signal_workflow(&self, request: WorkflowSignalRequest) -> Result<(), TransportError> {
        self.record(RecordedCall::SignalWorkflow(request));
        pop(&self.signal).unwrap_or(Ok(()))
    }

    async fn get_workflow_with_wait(
        &self,
        request: WorkflowGetRequest,
    ) -> Result<WorkflowGetResponse, TransportError> {
        self.record(RecordedCall::GetWorkflowWithWait(request));
        pop(&self.get).unwrap_or_else(|| {
            Ok(WorkflowGetResponse {
                workflow_run_id: MOCK_RUN_ID.to_string(),
                workflow_status: Some(WorkflowStatus::Completed),
                results: None,
            })
        })
    }

    async fn reset_workflow(
        &self,
        request: WorkflowResetRequest,
    ) -> Result<WorkflowResetResponse, TransportError> {
        self.record(RecordedCall::ResetWorkflow(request));
        pop(&self.reset).unwrap_or_else(|| {
            Ok(WorkflowResetResponse {
                workflow_run_id: MOCK_RUN_ID.to_string(),
            })
        })
    }

    async fn cancel_workflow(&self, request: WorkflowCancelRequest) -> Result<(), TransportError> {
        self.record(RecordedCall::CancelWorkflow(request));
        pop(&self.cancel).unwrap_or(Ok(()))
    }

    async fn get_query_attributes(
        &self,
        request: WorkflowGetQueryAttributesRequest,
    ) -> Result<WorkflowGetQueryAttributesResponse, TransportError> {
        self.record(RecordedCall::GetQueryAttributes(request));
        pop(&self.query_attributes).unwrap_or_else(|| {
            Ok(WorkflowGetQueryAttributesResponse {
                query_attributes: Some(Vec::new()),
            })
        })
    }

    async fn get_search_attributes(
        &self,
        request: WorkflowGetSearchAttributesRequest,
    ) -> Result<WorkflowGetSearchAttributesResponse, TransportError> {
        self.record(RecordedCall::GetSearchAttributes(request));
        pop(&self.search_attributes).unwrap_or_else(|| {
            Ok(WorkflowGetSearchAttributesResponse {
                search_attributes: Some(Vec::new()),
            })
        })
    }

    async fn search_workflow(
        &self,
        request: WorkflowSearchRequest,
    ) -> Result<WorkflowSearchResponse, TransportError> {
        self.record(RecordedCall::SearchWorkflow(request));
        pop(&self.search).unwrap_or_else(|| Ok(WorkflowSearchResponse::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unscripted_calls_get_defaults() {
        let service = MockWorkflowService::new();
        let response = service
            .start_workflow(WorkflowStartRequest {
                workflow_id: "wf-1".to_string(),
                iwf_worker_url: "http://localhost:8802".to_string(),
                iwf_workflow_type: "OrderWorkflow".to_string(),
                workflow_timeout_seconds: 0,
                start_state_id: "Created".to_string(),
                state_input: None,
                workflow_start_options: None,
            })
            .await
            .unwrap();

        assert_eq!(response.workflow_run_id, MOCK_RUN_ID);
        assert_eq!(service.call_count(), 1);
        assert!(matches!(service.calls()[0], RecordedCall::StartWorkflow(_)));
    }

    #[tokio::test]
    async fn test_scripted_responses_are_served_in_order() {
        let service = MockWorkflowService::new();
        service.script_cancel_workflow(Err(TransportError::HttpStatus {
            endpoint: WORKFLOW_CANCEL_API_PATH.to_string(),
            status: 404,
            body: "workflow not found".to_string(),
        }));

        let request = WorkflowCancelRequest {
            workflow_id: "wf-1".to_string(),
            workflow_run_id: None,
        };
        let err = service.cancel_workflow(request.clone()).await.unwrap_err();
        assert_eq!(err.http_status(), Some(404));
        assert!(service.cancel_workflow(request).await.is_ok());
        assert_eq!(service.call_count(), 2);
    }
}
