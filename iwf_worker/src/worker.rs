//! Dispatch of server callbacks to registered workflow states.
//!
//! The iWF server runs a state in two phases. For `start` it sends the
//! state input and the loaded attributes and expects the commands to wait
//! for. For `decide` it sends the command results and the state locals
//! written during `start`, and expects the next states.

use std::collections::HashMap;
use std::sync::Arc;

use iwf_core::{EncodingError, JsonObjectEncoder, ObjectEncoder, TypeDescriptor};
use iwf_proto::{
    KeyValue, SearchAttribute, WorkflowStateDecideRequest, WorkflowStateDecideResponse,
    WorkflowStateStartRequest, WorkflowStateStartResponse,
};
use iwf_workflow::mapper::{command_request_to_wire, command_results_from_wire, state_decision_to_wire};
use iwf_workflow::{
    Attributes, Context, QueryAttributes, Registry, SearchAttributes, StateDecision, StateDef,
    StateError, StateLocals,
};
use thiserror::Error;
use tracing::{debug, info};

/// Worker errors
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Workflow {0} is not registered")]
    UnregisteredWorkflow(String),

    #[error("State {state_id} is not registered for workflow {workflow_type}")]
    UnknownState {
        workflow_type: String,
        state_id: String,
    },

    /// A decision moved to a state the workflow does not declare
    #[error("Decision of {workflow_type} moves to unregistered state {state_id}")]
    UnknownTargetState {
        workflow_type: String,
        state_id: String,
    },

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// User state code failed
    #[error(transparent)]
    State(#[from] StateError),
}

impl WorkerError {
    /// Whether the callback named something the registry does not know
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WorkerError::UnregisteredWorkflow(_) | WorkerError::UnknownState { .. }
        )
    }
}

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Worker configuration options
#[derive(Clone)]
pub struct WorkerOptions {
    /// Must match the encoder used by the clients of these workflows
    pub object_encoder: Arc<dyn ObjectEncoder>,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            object_encoder: Arc::new(JsonObjectEncoder::new()),
        }
    }
}

impl std::fmt::Debug for WorkerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerOptions")
            .field("object_encoder", &self.object_encoder.encoding())
            .finish()
    }
}

/// Runs the `start` and `decide` phases of registered states
#[derive(Debug, Clone)]
pub struct WorkerService {
    registry: Arc<Registry>,
    options: WorkerOptions,
}

impl WorkerService {
    pub fn new(registry: Arc<Registry>, options: WorkerOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn handle_workflow_state_start(
        &self,
        request: WorkflowStateStartRequest,
    ) -> WorkerResult<WorkflowStateStartResponse> {
        let state = self.state(&request.workflow_type, &request.workflow_state_id)?;
        let encoder = self.options.object_encoder.as_ref();
        let ctx = Context::from(request.context);
        debug!(
            workflow_type = %request.workflow_type,
            workflow_id = %ctx.workflow_id,
            state_id = %request.workflow_state_id,
            "Running state start"
        );

        let input = state
            .input_type()
            .decode_optional(encoder, request.state_input.as_ref())?;
        let attributes = self.load_attributes(
            &request.workflow_type,
            request.query_attributes.as_deref(),
            request.search_attributes.as_deref(),
        )?;
        let mut locals = StateLocals::new(self.options.object_encoder.clone());

        let command_request = state.start(&ctx, &input, &attributes, &mut locals).await?;

        Ok(WorkflowStateStartResponse {
            command_request: command_request_to_wire(&command_request, encoder)?,
            upsert_state_locals: non_empty(locals.upserts()),
            record_events: non_empty(locals.recorded_events().to_vec()),
        })
    }

    pub async fn handle_workflow_state_decide(
        &self,
        request: WorkflowStateDecideRequest,
    ) -> WorkerResult<WorkflowStateDecideResponse> {
        let workflow_type = request.workflow_type.as_str();
        let state = self.state(workflow_type, &request.workflow_state_id)?;
        let encoder = self.options.object_encoder.as_ref();
        let ctx = Context::from(request.context);
        debug!(
            workflow_type = %workflow_type,
            workflow_id = %ctx.workflow_id,
            state_id = %request.workflow_state_id,
            "Running state decide"
        );

        let input = state
            .input_type()
            .decode_optional(encoder, request.state_input.as_ref())?;
        let empty = HashMap::new();
        let results = command_results_from_wire(
            request.command_results.as_ref(),
            self.registry
                .signal_channel_types(workflow_type)
                .unwrap_or(&empty),
            self.registry
                .inter_state_channel_types(workflow_type)
                .unwrap_or(&empty),
            self.registry
                .long_running_activity_types(workflow_type)
                .unwrap_or(&empty),
            encoder,
        )?;
        let mut attributes = self.load_attributes(
            workflow_type,
            request.query_attributes.as_deref(),
            request.search_attributes.as_deref(),
        )?;
        let mut locals = StateLocals::from_wire(
            self.options.object_encoder.clone(),
            request.state_locals.unwrap_or_default(),
        );

        let decision = state
            .decide(&ctx, &input, &results, &mut attributes, &mut locals)
            .await?;
        let state_decision = self.decision_to_wire(workflow_type, &decision)?;
        info!(
            workflow_type = %workflow_type,
            workflow_id = %ctx.workflow_id,
            state_id = %request.workflow_state_id,
            next_states = decision.next_states().len(),
            "State decided"
        );

        Ok(WorkflowStateDecideResponse {
            state_decision,
            upsert_search_attributes: non_empty(attributes.search.upserts_to_wire()),
            upsert_query_attributes: non_empty(attributes.query.upserts_to_wire(encoder)?),
            record_events: non_empty(locals.recorded_events().to_vec()),
        })
    }

    fn state(&self, workflow_type: &str, state_id: &str) -> WorkerResult<&StateDef> {
        if self.registry.workflow(workflow_type).is_none() {
            return Err(WorkerError::UnregisteredWorkflow(workflow_type.to_string()));
        }
        self.registry
            .workflow_state(workflow_type, state_id)
            .ok_or_else(|| WorkerError::UnknownState {
                workflow_type: workflow_type.to_string(),
                state_id: state_id.to_string(),
            })
    }

    fn load_attributes(
        &self,
        workflow_type: &str,
        query: Option<&[KeyValue]>,
        search: Option<&[SearchAttribute]>,
    ) -> WorkerResult<Attributes> {
        let query_types: HashMap<String, TypeDescriptor> = self
            .registry
            .query_attribute_types(workflow_type)
            .cloned()
            .unwrap_or_default();
        let search_types = self
            .registry
            .search_attribute_types(workflow_type)
            .cloned()
            .unwrap_or_default();

        let query = QueryAttributes::from_wire(
            query_types,
            query.unwrap_or_default(),
            self.options.object_encoder.as_ref(),
        )?;
        let search = SearchAttributes::from_wire(search_types, search.unwrap_or_default());
        Ok(Attributes::new(query, search))
    }

    /// Map a decision, filling in the registered options of every target
    /// state that did not get explicit ones
    fn decision_to_wire(
        &self,
        workflow_type: &str,
        decision: &StateDecision,
    ) -> WorkerResult<iwf_proto::StateDecision> {
        let mut wire = state_decision_to_wire(decision, self.options.object_encoder.as_ref())?;
        let movements = decision.next_states().iter();
        for (movement, wire_movement) in movements.zip(wire.next_states.iter_mut().flatten()) {
            if movement.is_terminal() || wire_movement.next_state_options.is_some() {
                continue;
            }
            let target = self
                .registry
                .workflow_state(workflow_type, &movement.state_id)
                .ok_or_else(|| WorkerError::UnknownTargetState {
                    workflow_type: workflow_type.to_string(),
                    state_id: movement.state_id.clone(),
                })?;
            wire_movement.next_state_options = Some(target.options().to_wire());
        }
        Ok(wire)
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
