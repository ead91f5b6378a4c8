//! HTTP implementation of [`WorkflowService`].

use std::time::Duration;

use async_trait::async_trait;
use iwf_core::TransportError;
use iwf_proto::workflow_service::*;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

/// Talks JSON over HTTP to an iWF server
#[derive(Debug, Clone)]
pub struct HttpWorkflowService {
    client: Client,
    base_url: String,
    long_poll_timeout: Duration,
}

impl HttpWorkflowService {
    pub fn new(
        server_url: &str,
        request_timeout: Duration,
        long_poll_timeout: Duration,
    ) -> Result<Self, TransportError> {
        if !(server_url.starts_with("http://") || server_url.starts_with("https://")) {
            return Err(TransportError::InvalidEndpoint(server_url.to_string()));
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::request_failed(server_url, e))?;

        Ok(Self {
            client,
            base_url: server_url.trim_end_matches('/').to_string(),
            long_poll_timeout,
        })
    }

    async fn send<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Sending request to iWF server");

        let mut request = self.client.post(&url).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::request_failed(path, e))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(TransportError::HttpStatus {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, TransportError> {
        let response = self.send(path, body, timeout).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::request_failed(path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::MalformedResponse {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }

    /// POST for APIs that answer with an empty body
    async fn post_ack<B: Serialize>(&self, path: &str, body: &B) -> Result<(), TransportError> {
        self.send(path, body, None).await?;
        Ok(())
    }
}

#[async_trait]
impl WorkflowService for HttpWorkflowService {
    async fn start_workflow(
        &self,
        request: WorkflowStartRequest,
    ) -> Result<WorkflowStartResponse, TransportError> {
        self.post(WORKFLOW_START_API_PATH, &request, None).await
    }

    async fn signal_workflow(&self, request: WorkflowSignalRequest) -> Result<(), TransportError> {
        self.post_ack(WORKFLOW_SIGNAL_API_PATH, &request).await
    }

    async fn get_workflow_with_wait(
        &self,
        request: WorkflowGetRequest,
    ) -> Result<WorkflowGetResponse, TransportError> {
        self.post(
            WORKFLOW_GET_WITH_WAIT_API_PATH,
            &request,
            Some(self.long_poll_timeout),
        )
        .await
    }

    async fn reset_workflow(
        &self,
        request: WorkflowResetRequest,
    ) -> Result<WorkflowResetResponse, TransportError> {
        self.post(WORKFLOW_RESET_API_PATH, &request, None).await
    }

    async fn cancel_workflow(&self, request: WorkflowCancelRequest) -> Result<(), TransportError> {
        self.post_ack(WORKFLOW_CANCEL_API_PATH, &request).await
    }

    async fn get_query_attributes(
        &self,
        request: WorkflowGetQueryAttributesRequest,
    ) -> Result<WorkflowGetQueryAttributesResponse, TransportError> {
        self.post(WORKFLOW_GET_QUERY_ATTRIBUTES_API_PATH, &request, None)
            .await
    }

    async fn get_search_attributes(
        &self,
        request: WorkflowGetSearchAttributesRequest,
    ) -> Result<WorkflowGetSearchAttributesResponse, TransportError> {
        self.post(WORKFLOW_GET_SEARCH_ATTRIBUTES_API_PATH, &request, None)
            .await
    }

    async fn search_workflow(
        &self,
        request: WorkflowSearchRequest,
    ) -> Result<WorkflowSearchResponse, TransportError> {
        self.post(WORKFLOW_SEARCH_API_PATH, &request, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_url_without_scheme() {
        let err = HttpWorkflowService::new(
            "localhost:8801",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, TransportError::InvalidEndpoint(_)));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let service = HttpWorkflowService::new(
            "http://localhost:8801/",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(service.base_url, "http://localhost:8801");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_retryable() {
        let service = HttpWorkflowService::new(
            "http://127.0.0.1:1",
            Duration::from_secs(2),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = service
            .cancel_workflow(WorkflowCancelRequest {
                workflow_id: "wf-1".to_string(),
                workflow_run_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::RequestFailed { .. }));
        assert!(err.is_retryable());
    }
}
