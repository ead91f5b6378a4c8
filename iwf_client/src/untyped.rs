//! Untyped client: thin wrapper over the server API.
//!
//! Payloads are already encoded and no registry checks happen here; the
//! typed [`crate::Client`] does both before delegating.

use std::sync::Arc;

use iwf_core::EncodedObject;
use iwf_proto::workflow_service::*;
use iwf_proto::{KeyValue, SearchAttribute, SearchAttributeKeyAndType};
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::http::HttpWorkflowService;
use crate::options::{ClientOptions, ResetWorkflowRequest, WorkflowStartOptions};

#[derive(Clone)]
pub struct UntypedClient {
    service: Arc<dyn WorkflowService>,
    options: ClientOptions,
}

impl UntypedClient {
    /// Client talking HTTP to `options.server_url`
    pub fn new(options: ClientOptions) -> ClientResult<Self> {
        let service = HttpWorkflowService::new(
            &options.server_url,
            options.request_timeout,
            options.long_poll_timeout,
        )?;
        Ok(Self::with_service(Arc::new(service), options))
    }

    /// Client over an existing service implementation
    pub fn with_service(service: Arc<dyn WorkflowService>, options: ClientOptions) -> Self {
        Self { service, options }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Start a workflow and return its run id
    pub async fn start_workflow(
        &self,
        workflow_type: &str,
        start_state_id: &str,
        state_input: Option<EncodedObject>,
        workflow_id: &str,
        options: &WorkflowStartOptions,
    ) -> ClientResult<String> {
        let request = WorkflowStartRequest {
            workflow_id: workflow_id.to_string(),
            iwf_worker_url: self.options.worker_url.clone(),
            iwf_workflow_type: workflow_type.to_string(),
            workflow_timeout_seconds: options.workflow_timeout_seconds,
            start_state_id: start_state_id.to_string(),
            state_input,
            workflow_start_options: options.to_wire(),
        };

        let response = self.service.start_workflow(request).await?;
        info!(
            workflow_type = %workflow_type,
            workflow_id = %workflow_id,
            run_id = %response.workflow_run_id,
            "Started workflow"
        );
        Ok(response.workflow_run_id)
    }

    pub async fn signal_workflow(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
        signal_channel_name: &str,
        signal_value: Option<EncodedObject>,
    ) -> ClientResult<()> {
        debug!(
            workflow_id = %workflow_id,
            channel = %signal_channel_name,
            "Signaling workflow"
        );
        self.service
            .signal_workflow(WorkflowSignalRequest {
                workflow_id: workflow_id.to_string(),
                workflow_run_id: workflow_run_id.map(str::to_string),
                signal_channel_name: signal_channel_name.to_string(),
                signal_value,
            })
            .await?;
        Ok(())
    }

    /// Wait for completion and return every completion output
    pub async fn get_complex_workflow_result_with_wait(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
    ) -> ClientResult<Vec<StateCompletionOutput>> {
        debug!(workflow_id = %workflow_id, "Waiting for workflow results");
        let response = self
            .service
            .get_workflow_with_wait(WorkflowGetRequest {
                workflow_id: workflow_id.to_string(),
                workflow_run_id: workflow_run_id.map(str::to_string),
                needs_results: true,
            })
            .await?;
        Ok(response.results.unwrap_or_default())
    }

    /// Wait for completion and return the single completion output.
    ///
    /// No output gives `Ok(None)`. More than one output gives
    /// [`ClientError::MultipleResults`], and a single output without a
    /// value is a server contract violation.
    pub async fn get_simple_workflow_result_with_wait(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
    ) -> ClientResult<Option<EncodedObject>> {
        let mut results = self
            .get_complex_workflow_result_with_wait(workflow_id, workflow_run_id)
            .await?;
        match results.len() {
            0 => Ok(None),
            1 => match results.pop().and_then(|r| r.completed_state_output) {
                Some(output) => Ok(Some(output)),
                None => Err(ClientError::server_contract_violation(
                    "completed state output is missing",
                )),
            },
            n => Err(ClientError::MultipleResults(n)),
        }
    }

    /// Reset a workflow and return the new run id
    pub async fn reset_workflow(&self, request: ResetWorkflowRequest) -> ClientResult<String> {
        let workflow_id = request.workflow_id.clone();
        let response = self.service.reset_workflow(request.into()).await?;
        info!(
            workflow_id = %workflow_id,
            run_id = %response.workflow_run_id,
            "Reset workflow"
        );
        Ok(response.workflow_run_id)
    }

    pub async fn cancel_workflow(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
    ) -> ClientResult<()> {
        self.service
            .cancel_workflow(WorkflowCancelRequest {
                workflow_id: workflow_id.to_string(),
                workflow_run_id: workflow_run_id.map(str::to_string),
            })
            .await?;
        info!(workflow_id = %workflow_id, "Canceled workflow");
        Ok(())
    }

    /// Fetch query attributes; `None` keys asks the server for all of them
    pub async fn get_query_attributes(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
        attribute_keys: Option<Vec<String>>,
    ) -> ClientResult<Vec<KeyValue>> {
        let response = self
            .service
            .get_query_attributes(WorkflowGetQueryAttributesRequest {
                workflow_id: workflow_id.to_string(),
                workflow_run_id: workflow_run_id.map(str::to_string),
                attribute_keys,
            })
            .await?;
        response
            .query_attributes
            .ok_or_else(|| ClientError::server_contract_violation("query attributes not returned"))
    }

    pub async fn get_search_attributes(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
        attribute_keys: Vec<SearchAttributeKeyAndType>,
    ) -> ClientResult<Vec<SearchAttribute>> {
        let response = self
            .service
            .get_search_attributes(WorkflowGetSearchAttributesRequest {
                workflow_id: workflow_id.to_string(),
                workflow_run_id: workflow_run_id.map(str::to_string),
                attribute_keys,
            })
            .await?;
        response
            .search_attributes
            .ok_or_else(|| ClientError::server_contract_violation("search attributes not returned"))
    }

    pub async fn search_workflow(
        &self,
        query: &str,
        page_size: i32,
    ) -> ClientResult<WorkflowSearchResponse> {
        debug!(query = %query, page_size, "Searching workflows");
        Ok(self
            .service
            .search_workflow(WorkflowSearchRequest {
                query: query.to_string(),
                page_size,
            })
            .await?)
    }
}

impl std::fmt::Debug for UntypedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UntypedClient")
            .field("service", &"<dyn WorkflowService>")
            .field("options", &self.options)
            .finish()
    }
}
