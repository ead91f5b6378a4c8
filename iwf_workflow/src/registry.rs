//! Workflow registry.
//!
//! The registry indexes every registered [`WorkflowDefinition`] so that the
//! client can validate calls and the worker can find state code and decode
//! payloads. It is filled once at startup through `&mut self` and then shared
//! read-only as `Arc<Registry>`.

use std::collections::HashMap;

use iwf_core::TypeDescriptor;
use tracing::debug;

use crate::definition::{SearchAttributeType, Workflow, WorkflowDefinition};
use crate::error::DefinitionConflictError;
use crate::state::StateDef;

/// Index of registered workflow definitions
#[derive(Debug, Default)]
pub struct Registry {
    workflows: HashMap<String, WorkflowDefinition>,
    /// Workflow type to state id to state
    states: HashMap<String, HashMap<String, StateDef>>,
    signal_types: HashMap<String, HashMap<String, TypeDescriptor>>,
    query_attribute_types: HashMap<String, HashMap<String, TypeDescriptor>>,
    search_attribute_types: HashMap<String, HashMap<String, SearchAttributeType>>,
    inter_state_channel_types: HashMap<String, HashMap<String, TypeDescriptor>>,
    long_running_activity_types: HashMap<String, HashMap<String, TypeDescriptor>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the definition of `W`
    pub fn register<W: Workflow>(&mut self, workflow: &W) -> Result<(), DefinitionConflictError> {
        self.add_workflow(WorkflowDefinition::of(workflow))
    }

    /// Register a workflow definition.
    ///
    /// Everything is checked before anything is indexed, so a conflict leaves
    /// the registry unchanged.
    pub fn add_workflow(
        &mut self,
        definition: WorkflowDefinition,
    ) -> Result<(), DefinitionConflictError> {
        let workflow_type = definition.workflow_type().to_string();
        if self.workflows.contains_key(&workflow_type) {
            return Err(DefinitionConflictError::WorkflowType(workflow_type));
        }

        let mut states = HashMap::with_capacity(definition.states().len());
        for state in definition.states() {
            if states
                .insert(state.state_id().to_string(), state.clone())
                .is_some()
            {
                return Err(DefinitionConflictError::State {
                    workflow_type,
                    state_id: state.state_id().to_string(),
                });
            }
        }

        let signal_types = collect_unique(
            definition
                .signal_channels()
                .iter()
                .map(|channel| (channel.name(), channel.value_type())),
            |name| DefinitionConflictError::SignalChannel {
                workflow_type: workflow_type.clone(),
                name,
            },
        )?;
        let query_attribute_types = collect_unique(
            definition
                .query_attributes()
                .iter()
                .map(|attribute| (attribute.key(), attribute.value_type())),
            |key| DefinitionConflictError::QueryAttribute {
                workflow_type: workflow_type.clone(),
                key,
            },
        )?;
        let search_attribute_types = collect_unique(
            definition
                .search_attributes()
                .iter()
                .map(|attribute| (attribute.key(), attribute.value_type())),
            |key| DefinitionConflictError::SearchAttribute {
                workflow_type: workflow_type.clone(),
                key,
            },
        )?;
        let inter_state_channel_types = collect_unique(
            definition
                .inter_state_channels()
                .iter()
                .map(|channel| (channel.name(), channel.value_type())),
            |name| DefinitionConflictError::InterStateChannel {
                workflow_type: workflow_type.clone(),
                name,
            },
        )?;
        let long_running_activity_types = collect_unique(
            definition
                .long_running_activities()
                .iter()
                .map(|activity| (activity.activity_type(), activity.output_type())),
            |activity_type| DefinitionConflictError::LongRunningActivity {
                workflow_type: workflow_type.clone(),
                activity_type,
            },
        )?;

        self.states.insert(workflow_type.clone(), states);
        self.signal_types
            .insert(workflow_type.clone(), signal_types);
        self.query_attribute_types
            .insert(workflow_type.clone(), query_attribute_types);
        self.search_attribute_types
            .insert(workflow_type.clone(), search_attribute_types);
        self.inter_state_channel_types
            .insert(workflow_type.clone(), inter_state_channel_types);
        self.long_running_activity_types
            .insert(workflow_type.clone(), long_running_activity_types);

        debug!(
            workflow_type = %workflow_type,
            states = definition.states().len(),
            "Registered workflow"
        );
        self.workflows.insert(workflow_type, definition);
        Ok(())
    }

    pub fn workflow(&self, workflow_type: &str) -> Option<&WorkflowDefinition> {
        self.workflows.get(workflow_type)
    }

    pub fn workflow_state(&self, workflow_type: &str, state_id: &str) -> Option<&StateDef> {
        self.states.get(workflow_type)?.get(state_id)
    }

    /// Signal channel name to value type; `None` if the workflow is unregistered
    pub fn signal_channel_types(
        &self,
        workflow_type: &str,
    ) -> Option<&HashMap<String, TypeDescriptor>> {
        self.signal_types.get(workflow_type)
    }

    pub fn query_attribute_types(
        &self,
        workflow_type: &str,
    ) -> Option<&HashMap<String, TypeDescriptor>> {
        self.query_attribute_types.get(workflow_type)
    }

    pub fn search_attribute_types(
        &self,
        workflow_type: &str,
    ) -> Option<&HashMap<String, SearchAttributeType>> {
        self.search_attribute_types.get(workflow_type)
    }

    pub fn inter_state_channel_types(
        &self,
        workflow_type: &str,
    ) -> Option<&HashMap<String, TypeDescriptor>> {
        self.inter_state_channel_types.get(workflow_type)
    }

    /// Activity type to output type
    pub fn long_running_activity_types(
        &self,
        workflow_type: &str,
    ) -> Option<&HashMap<String, TypeDescriptor>> {
        self.long_running_activity_types.get(workflow_type)
    }

    pub fn workflow_types(&self) -> impl Iterator<Item = &str> {
        self.workflows.keys().map(String::as_str)
    }
}

fn collect_unique<'a, V>(
    entries: impl Iterator<Item = (&'a str, V)>,
    conflict: impl Fn(String) -> DefinitionConflictError,
) -> Result<HashMap<String, V>, DefinitionConflictError> {
    let mut map = HashMap::new();
    for (name, value) in entries {
        if map.insert(name.to_string(), value).is_some() {
            return Err(conflict(name.to_string()));
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Attributes, StateLocals};
    use crate::command::CommandResults;
    use crate::context::Context;
    use crate::decision::StateDecision;
    use crate::definition::WorkflowDefinitionBuilder;
    use crate::error::StateError;
    use crate::state::WorkflowState;
    use async_trait::async_trait;

    struct Created;

    #[async_trait]
    impl WorkflowState for Created {
        const STATE_ID: &'static str = "Created";
        type Input = String;

        async fn decide(
            &self,
            _ctx: &Context,
            _input: &String,
            _results: &CommandResults,
            _attributes: &mut Attributes,
            _locals: &mut StateLocals,
        ) -> Result<StateDecision, StateError> {
            Ok(StateDecision::dead_end())
        }
    }

    struct OrderWorkflow;

    impl Workflow for OrderWorkflow {
        const WORKFLOW_TYPE: &'static str = "OrderWorkflow";

        fn define(&self, builder: WorkflowDefinitionBuilder) -> WorkflowDefinitionBuilder {
            builder
                .state(StateDef::starting(Created))
                .signal_channel::<bool>("cancel")
                .query_attribute::<i64>("count")
                .search_attribute("CustomKeywordField", SearchAttributeType::Keyword)
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        registry.register(&OrderWorkflow).unwrap();

        assert!(registry.workflow("OrderWorkflow").is_some());
        let state = registry.workflow_state("OrderWorkflow", "Created").unwrap();
        assert!(state.can_start_workflow());
        assert!(registry.workflow_state("OrderWorkflow", "Shipped").is_none());

        let signals = registry.signal_channel_types("OrderWorkflow").unwrap();
        assert!(signals["cancel"].is_instance_of::<bool>());
        assert!(registry.query_attribute_types("OrderWorkflow").unwrap()["count"]
            .is_instance_of::<i64>());
        assert_eq!(
            registry.search_attribute_types("OrderWorkflow").unwrap()["CustomKeywordField"],
            SearchAttributeType::Keyword
        );
        assert!(registry
            .inter_state_channel_types("OrderWorkflow")
            .unwrap()
            .is_empty());
        assert!(registry.signal_channel_types("Unknown").is_none());
    }

    #[test]
    fn test_duplicate_workflow_type_is_rejected() {
        let mut registry = Registry::new();
        registry.register(&OrderWorkflow).unwrap();

        let err = registry.register(&OrderWorkflow).unwrap_err();
        assert_eq!(
            err,
            DefinitionConflictError::WorkflowType("OrderWorkflow".to_string())
        );
    }

    #[test]
    fn test_duplicate_state_keeps_first_registration() {
        let mut registry = Registry::new();
        let definition = WorkflowDefinition::builder("Dup")
            .state(StateDef::starting(Created))
            .state(StateDef::non_starting(Created))
            .build();

        let err = registry.add_workflow(definition).unwrap_err();
        assert_eq!(
            err,
            DefinitionConflictError::State {
                workflow_type: "Dup".to_string(),
                state_id: "Created".to_string(),
            }
        );
        assert!(registry.workflow("Dup").is_none());
        assert!(registry.workflow_state("Dup", "Created").is_none());
    }

    #[test]
    fn test_states_are_scoped_by_workflow_type() {
        let mut registry = Registry::new();
        registry
            .add_workflow(
                WorkflowDefinition::builder("Order_Workflow")
                    .state(StateDef::starting(Created))
                    .build(),
            )
            .unwrap();
        assert!(registry.workflow_state("Order", "Workflow_Created").is_none());

        struct WorkflowCreated;

        #[async_trait]
        impl WorkflowState for WorkflowCreated {
            const STATE_ID: &'static str = "Workflow_Created";
            type Input = ();

            async fn decide(
                &self,
                _ctx: &Context,
                _input: &(),
                _results: &CommandResults,
                _attributes: &mut Attributes,
                _locals: &mut StateLocals,
            ) -> Result<StateDecision, StateError> {
                Ok(StateDecision::dead_end())
            }
        }

        registry
            .add_workflow(
                WorkflowDefinition::builder("Order")
                    .state(StateDef::starting(WorkflowCreated))
                    .build(),
            )
            .unwrap();
        let first = registry
            .workflow_state("Order_Workflow", "Created")
            .unwrap();
        assert_eq!(first.input_type(), TypeDescriptor::of::<String>());
        let second = registry.workflow_state("Order", "Workflow_Created").unwrap();
        assert_eq!(second.input_type(), TypeDescriptor::of::<()>());
        assert!(registry.workflow_state("Order", "Created").is_none());
    }

    #[test]
    fn test_failed_registration_is_atomic() {
        let mut registry = Registry::new();
        let definition = WorkflowDefinition::builder("Broken")
            .state(StateDef::starting(Created))
            .signal_channel::<bool>("cancel")
            .signal_channel::<String>("cancel")
            .build();

        let err = registry.add_workflow(definition).unwrap_err();
        assert_eq!(
            err,
            DefinitionConflictError::SignalChannel {
                workflow_type: "Broken".to_string(),
                name: "cancel".to_string(),
            }
        );
        assert!(registry.workflow_state("Broken", "Created").is_none());
        assert!(registry.signal_channel_types("Broken").is_none());
        assert_eq!(registry.workflow_types().count(), 0);
    }
}
