//! HTTP endpoints the iWF server calls back into.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use iwf_proto::{
    WorkflowStateDecideRequest, WorkflowStateDecideResponse, WorkflowStateStartRequest,
    WorkflowStateStartResponse, WORKFLOW_STATE_DECIDE_API_PATH, WORKFLOW_STATE_START_API_PATH,
};
use tracing::warn;

use crate::worker::{WorkerError, WorkerService};

/// Router serving the state start and decide callbacks
pub fn create_router(worker: Arc<WorkerService>) -> Router {
    Router::new()
        .route(WORKFLOW_STATE_START_API_PATH, post(workflow_state_start))
        .route(WORKFLOW_STATE_DECIDE_API_PATH, post(workflow_state_decide))
        .with_state(worker)
}

async fn workflow_state_start(
    State(worker): State<Arc<WorkerService>>,
    Json(request): Json<WorkflowStateStartRequest>,
) -> Result<Json<WorkflowStateStartResponse>, WorkerError> {
    Ok(Json(worker.handle_workflow_state_start(request).await?))
}

async fn workflow_state_decide(
    State(worker): State<Arc<WorkerService>>,
    Json(request): Json<WorkflowStateDecideRequest>,
) -> Result<Json<WorkflowStateDecideResponse>, WorkerError> {
    Ok(Json(worker.handle_workflow_state_decide(request).await?))
}

impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            WorkerError::UnregisteredWorkflow(_) | WorkerError::UnknownState { .. } => {
                (StatusCode::NOT_FOUND, "not-found")
            }
            WorkerError::Encoding(_) => (StatusCode::BAD_REQUEST, "encoding-error"),
            WorkerError::State(_) | WorkerError::UnknownTargetState { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "state-api-error")
            }
        };
        warn!(error = %self, status = status.as_u16(), "State callback failed");

        (
            status,
            Json(serde_json::json!({
                "detail": self.to_string(),
                "errorType": error_type,
            })),
        )
            .into_response()
    }
}
