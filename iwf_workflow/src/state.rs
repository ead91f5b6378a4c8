//! Workflow states.
//!
//! A state is two async functions: `start` requests commands, and `decide`
//! looks at their results and picks the next states. [`WorkflowState`] is the
//! typed authoring trait; [`StateDef`] erases the input type so states of
//! different input types can live in one definition.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use iwf_core::{DynValue, TypeDescriptor};
use iwf_proto::shared as wire;
use serde::{de::DeserializeOwned, Serialize};

use crate::attributes::{Attributes, StateLocals};
use crate::command::{CommandRequest, CommandResults};
use crate::context::Context;
use crate::decision::StateDecision;
use crate::error::StateError;

/// How attributes are loaded for a state API call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeLoadingPolicy {
    #[default]
    LoadAllWithoutLocking,
    LoadNone,
}

impl From<AttributeLoadingPolicy> for wire::AttributeLoadingType {
    fn from(policy: AttributeLoadingPolicy) -> Self {
        match policy {
            AttributeLoadingPolicy::LoadAllWithoutLocking => {
                wire::AttributeLoadingType::LoadAllWithoutLocking
            }
            AttributeLoadingPolicy::LoadNone => wire::AttributeLoadingType::LoadNone,
        }
    }
}

/// Whether unfinished commands of a state carry over to the next states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandCarryOverPolicy {
    #[default]
    None,
    CarryOverAll,
}

impl From<CommandCarryOverPolicy> for wire::CommandCarryOverType {
    fn from(policy: CommandCarryOverPolicy) -> Self {
        match policy {
            CommandCarryOverPolicy::None => wire::CommandCarryOverType::None,
            CommandCarryOverPolicy::CarryOverAll => wire::CommandCarryOverType::CarryOverAll,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateOptions {
    pub query_attributes_loading_policy: AttributeLoadingPolicy,
    pub search_attributes_loading_policy: AttributeLoadingPolicy,
    pub command_carry_over_policy: CommandCarryOverPolicy,
}

impl StateOptions {
    pub fn to_wire(&self) -> wire::WorkflowStateOptions {
        wire::WorkflowStateOptions {
            search_attributes_loading_policy: Some(self.search_attributes_loading_policy.into()),
            query_attributes_loading_policy: Some(self.query_attributes_loading_policy.into()),
            command_carry_over_policy: Some(self.command_carry_over_policy.into()),
        }
    }
}

/// A state of a workflow, addressed by `STATE_ID`
#[async_trait]
pub trait WorkflowState: Send + Sync + 'static {
    const STATE_ID: &'static str;

    type Input: Serialize + DeserializeOwned + Send + Sync + 'static;

    fn options(&self) -> StateOptions {
        StateOptions::default()
    }

    /// Request the commands `decide` waits for. Attributes are read-only here.
    /// The default requests nothing, so `decide` runs right away.
    async fn start(
        &self,
        _ctx: &Context,
        _input: &Self::Input,
        _attributes: &Attributes,
        _locals: &mut StateLocals,
    ) -> Result<CommandRequest, StateError> {
        Ok(CommandRequest::empty())
    }

    /// Decide what happens next once the requested commands are ready
    async fn decide(
        &self,
        ctx: &Context,
        input: &Self::Input,
        results: &CommandResults,
        attributes: &mut Attributes,
        locals: &mut StateLocals,
    ) -> Result<StateDecision, StateError>;
}

#[async_trait]
trait ErasedState: Send + Sync {
    async fn start(
        &self,
        ctx: &Context,
        input: &DynValue,
        attributes: &Attributes,
        locals: &mut StateLocals,
    ) -> Result<CommandRequest, StateError>;

    async fn decide(
        &self,
        ctx: &Context,
        input: &DynValue,
        results: &CommandResults,
        attributes: &mut Attributes,
        locals: &mut StateLocals,
    ) -> Result<StateDecision, StateError>;
}

struct StateAdapter<S>(S);

impl<S: WorkflowState> StateAdapter<S> {
    fn input<'a>(&self, input: &'a DynValue) -> Result<&'a S::Input, StateError> {
        input
            .downcast_ref::<S::Input>()
            .ok_or_else(|| StateError::InputType {
                state_id: S::STATE_ID.to_string(),
                expected: std::any::type_name::<S::Input>(),
                actual: input.type_name(),
            })
    }
}

#[async_trait]
impl<S: WorkflowState> ErasedState for StateAdapter<S> {
    async fn start(
        &self,
        ctx: &Context,
        input: &DynValue,
        attributes: &Attributes,
        locals: &mut StateLocals,
    ) -> Result<CommandRequest, StateError> {
        let input = self.input(input)?;
        self.0.start(ctx, input, attributes, locals).await
    }

    async fn decide(
        &self,
        ctx: &Context,
        input: &DynValue,
        results: &CommandResults,
        attributes: &mut Attributes,
        locals: &mut StateLocals,
    ) -> Result<StateDecision, StateError> {
        let input = self.input(input)?;
        self.0.decide(ctx, input, results, attributes, locals).await
    }
}

/// A registered state: its id, whether it may start the workflow, its input
/// type and the state code itself
#[derive(Clone)]
pub struct StateDef {
    state_id: String,
    can_start_workflow: bool,
    input_type: TypeDescriptor,
    options: StateOptions,
    state: Arc<dyn ErasedState>,
}

impl StateDef {
    /// A state the workflow can be started at
    pub fn starting<S: WorkflowState>(state: S) -> Self {
        Self::new(state, true)
    }

    pub fn non_starting<S: WorkflowState>(state: S) -> Self {
        Self::new(state, false)
    }

    fn new<S: WorkflowState>(state: S, can_start_workflow: bool) -> Self {
        Self {
            state_id: S::STATE_ID.to_string(),
            can_start_workflow,
            input_type: TypeDescriptor::of::<S::Input>(),
            options: state.options(),
            state: Arc::new(StateAdapter(state)),
        }
    }

    pub fn state_id(&self) -> &str {
        &self.state_id
    }

    pub fn can_start_workflow(&self) -> bool {
        self.can_start_workflow
    }

    pub fn input_type(&self) -> TypeDescriptor {
        self.input_type
    }

    pub fn options(&self) -> &StateOptions {
        &self.options
    }

    pub async fn start(
        &self,
        ctx: &Context,
        input: &DynValue,
        attributes: &Attributes,
        locals: &mut StateLocals,
    ) -> Result<CommandRequest, StateError> {
        self.state.start(ctx, input, attributes, locals).await
    }

    pub async fn decide(
        &self,
        ctx: &Context,
        input: &DynValue,
        results: &CommandResults,
        attributes: &mut Attributes,
        locals: &mut StateLocals,
    ) -> Result<StateDecision, StateError> {
        self.state
            .decide(ctx, input, results, attributes, locals)
            .await
    }
}

impl fmt::Debug for StateDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDef")
            .field("state_id", &self.state_id)
            .field("can_start_workflow", &self.can_start_workflow)
            .field("input_type", &self.input_type)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iwf_core::JsonObjectEncoder;

    struct Echo;

    #[async_trait]
    impl WorkflowState for Echo {
        const STATE_ID: &'static str = "Echo";
        type Input = String;

        async fn decide(
            &self,
            _ctx: &Context,
            input: &String,
            _results: &CommandResults,
            _attributes: &mut Attributes,
            _locals: &mut StateLocals,
        ) -> Result<StateDecision, StateError> {
            Ok(StateDecision::graceful_complete_workflow(input.clone()))
        }
    }

    #[tokio::test]
    async fn test_default_start_requests_nothing() {
        let state = StateDef::starting(Echo);
        let ctx = Context::new("wf-1", "run-1", 0);
        let mut locals = StateLocals::new(Arc::new(JsonObjectEncoder::new()));

        let request = state
            .start(
                &ctx,
                &DynValue::new("hi".to_string()),
                &Attributes::default(),
                &mut locals,
            )
            .await
            .unwrap();
        assert!(request.commands().is_empty());
        assert_eq!(
            request.decider_trigger_type(),
            wire::DeciderTriggerType::AllCommandCompleted
        );
    }

    #[tokio::test]
    async fn test_wrong_input_type_is_reported() {
        let state = StateDef::non_starting(Echo);
        let ctx = Context::new("wf-1", "run-1", 0);
        let mut locals = StateLocals::new(Arc::new(JsonObjectEncoder::new()));

        let err = state
            .decide(
                &ctx,
                &DynValue::new(5i64),
                &CommandResults::default(),
                &mut Attributes::default(),
                &mut locals,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::InputType { .. }));
        assert!(!state.can_start_workflow());
        assert_eq!(state.input_type(), TypeDescriptor::of::<String>());
    }
}
