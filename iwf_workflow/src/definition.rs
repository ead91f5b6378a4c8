//! Workflow definitions.
//!
//! A [`WorkflowDefinition`] lists everything the SDK needs to know about a
//! workflow type ahead of time: its states, and the names and value types of
//! its signal channels, query attributes, search attributes, inter-state
//! channels and long running activities. Definitions are built once at
//! startup and registered with a [`crate::Registry`].

use std::fmt;

use iwf_core::TypeDescriptor;
use iwf_proto::shared as wire;
use serde::{de::DeserializeOwned, Serialize};

use crate::state::StateDef;

/// A workflow type that can be registered and addressed by the typed client.
///
/// The workflow type name is chosen by the developer and never derived from
/// the Rust type name.
///
/// ```
/// use iwf_workflow::{Workflow, WorkflowDefinitionBuilder};
///
/// struct OrderWorkflow;
///
/// impl Workflow for OrderWorkflow {
///     const WORKFLOW_TYPE: &'static str = "OrderWorkflow";
///
///     fn define(&self, builder: WorkflowDefinitionBuilder) -> WorkflowDefinitionBuilder {
///         builder.signal_channel::<bool>("cancel")
///     }
/// }
/// ```
pub trait Workflow {
    const WORKFLOW_TYPE: &'static str;

    /// Declare the workflow's states and typed channels
    fn define(&self, builder: WorkflowDefinitionBuilder) -> WorkflowDefinitionBuilder;
}

/// Everything declared by one workflow type
#[derive(Clone)]
pub struct WorkflowDefinition {
    workflow_type: String,
    states: Vec<StateDef>,
    signal_channels: Vec<SignalChannelDef>,
    query_attributes: Vec<QueryAttributeDef>,
    search_attributes: Vec<SearchAttributeDef>,
    inter_state_channels: Vec<InterStateChannelDef>,
    long_running_activities: Vec<LongRunningActivityDef>,
}

impl WorkflowDefinition {
    /// Start a definition; every declaration list starts out empty
    pub fn builder(workflow_type: impl Into<String>) -> WorkflowDefinitionBuilder {
        WorkflowDefinitionBuilder {
            definition: WorkflowDefinition {
                workflow_type: workflow_type.into(),
                states: Vec::new(),
                signal_channels: Vec::new(),
                query_attributes: Vec::new(),
                search_attributes: Vec::new(),
                inter_state_channels: Vec::new(),
                long_running_activities: Vec::new(),
            },
        }
    }

    /// Build the definition of `W` under `W::WORKFLOW_TYPE`
    pub fn of<W: Workflow>(workflow: &W) -> Self {
        workflow.define(Self::builder(W::WORKFLOW_TYPE)).build()
    }

    pub fn workflow_type(&self) -> &str {
        &self.workflow_type
    }

    pub fn states(&self) -> &[StateDef] {
        &self.states
    }

    pub fn signal_channels(&self) -> &[SignalChannelDef] {
        &self.signal_channels
    }

    pub fn query_attributes(&self) -> &[QueryAttributeDef] {
        &self.query_attributes
    }

    pub fn search_attributes(&self) -> &[SearchAttributeDef] {
        &self.search_attributes
    }

    pub fn inter_state_channels(&self) -> &[InterStateChannelDef] {
        &self.inter_state_channels
    }

    pub fn long_running_activities(&self) -> &[LongRunningActivityDef] {
        &self.long_running_activities
    }
}

impl fmt::Debug for WorkflowDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowDefinition")
            .field("workflow_type", &self.workflow_type)
            .field("states", &self.states)
            .field("signal_channels", &self.signal_channels)
            .field("query_attributes", &self.query_attributes)
            .field("search_attributes", &self.search_attributes)
            .field("inter_state_channels", &self.inter_state_channels)
            .field("long_running_activities", &self.long_running_activities)
            .finish()
    }
}

/// Builder for [`WorkflowDefinition`]
#[derive(Debug)]
pub struct WorkflowDefinitionBuilder {
    definition: WorkflowDefinition,
}

impl WorkflowDefinitionBuilder {
    pub fn state(mut self, state: StateDef) -> Self {
        self.definition.states.push(state);
        self
    }

    pub fn signal_channel<T>(mut self, name: impl Into<String>) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.definition
            .signal_channels
            .push(SignalChannelDef::new::<T>(name));
        self
    }

    pub fn query_attribute<T>(mut self, key: impl Into<String>) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.definition
            .query_attributes
            .push(QueryAttributeDef::new::<T>(key));
        self
    }

    pub fn search_attribute(mut self, key: impl Into<String>, value_type: SearchAttributeType) -> Self {
        self.definition
            .search_attributes
            .push(SearchAttributeDef::new(key, value_type));
        self
    }

    pub fn inter_state_channel<T>(mut self, name: impl Into<String>) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.definition
            .inter_state_channels
            .push(InterStateChannelDef::new::<T>(name));
        self
    }

    /// Declare an activity type and the type of its output
    pub fn long_running_activity<T>(mut self, activity_type: impl Into<String>) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.definition
            .long_running_activities
            .push(LongRunningActivityDef::new::<T>(activity_type));
        self
    }

    pub fn build(self) -> WorkflowDefinition {
        self.definition
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalChannelDef {
    name: String,
    value_type: TypeDescriptor,
}

impl SignalChannelDef {
    pub fn new<T>(name: impl Into<String>) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            value_type: TypeDescriptor::of::<T>(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> TypeDescriptor {
        self.value_type
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAttributeDef {
    key: String,
    value_type: TypeDescriptor,
}

impl QueryAttributeDef {
    pub fn new<T>(key: impl Into<String>) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            value_type: TypeDescriptor::of::<T>(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value_type(&self) -> TypeDescriptor {
        self.value_type
    }
}

/// Value types the server can index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchAttributeType {
    Text,
    Keyword,
    Int64,
}

impl From<SearchAttributeType> for wire::SearchAttributeValueType {
    fn from(value_type: SearchAttributeType) -> Self {
        match value_type {
            SearchAttributeType::Text => wire::SearchAttributeValueType::Text,
            SearchAttributeType::Keyword => wire::SearchAttributeValueType::Keyword,
            SearchAttributeType::Int64 => wire::SearchAttributeValueType::Int,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchAttributeDef {
    key: String,
    value_type: SearchAttributeType,
}

impl SearchAttributeDef {
    pub fn new(key: impl Into<String>, value_type: SearchAttributeType) -> Self {
        Self {
            key: key.into(),
            value_type,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value_type(&self) -> SearchAttributeType {
        self.value_type
    }
}

/// A search attribute value, tagged with how it is indexed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAttributeValue {
    Keyword(String),
    Text(String),
    Int(i64),
}

impl SearchAttributeValue {
    /// Read the field selected by the declared type; `None` if the server
    /// sent no value for it
    pub fn from_wire(attribute: &wire::SearchAttribute, declared: SearchAttributeType) -> Option<Self> {
        match declared {
            SearchAttributeType::Int64 => attribute.integer_value.map(SearchAttributeValue::Int),
            SearchAttributeType::Keyword => attribute
                .string_value
                .clone()
                .map(SearchAttributeValue::Keyword),
            SearchAttributeType::Text => attribute
                .string_value
                .clone()
                .map(SearchAttributeValue::Text),
        }
    }

    pub fn to_wire(&self, key: impl Into<String>) -> wire::SearchAttribute {
        let key = key.into();
        match self {
            SearchAttributeValue::Int(value) => wire::SearchAttribute {
                key,
                string_value: None,
                integer_value: Some(*value),
                value_type: Some(wire::SearchAttributeValueType::Int),
            },
            SearchAttributeValue::Keyword(value) => wire::SearchAttribute {
                key,
                string_value: Some(value.clone()),
                integer_value: None,
                value_type: Some(wire::SearchAttributeValueType::Keyword),
            },
            SearchAttributeValue::Text(value) => wire::SearchAttribute {
                key,
                string_value: Some(value.clone()),
                integer_value: None,
                value_type: Some(wire::SearchAttributeValueType::Text),
            },
        }
    }

    pub fn value_type(&self) -> SearchAttributeType {
        match self {
            SearchAttributeValue::Keyword(_) => SearchAttributeType::Keyword,
            SearchAttributeValue::Text(_) => SearchAttributeType::Text,
            SearchAttributeValue::Int(_) => SearchAttributeType::Int64,
        }
    }
}

/// Channel for passing values between states of the same workflow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterStateChannelDef {
    name: String,
    value_type: TypeDescriptor,
}

impl InterStateChannelDef {
    pub fn new<T>(name: impl Into<String>) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            value_type: TypeDescriptor::of::<T>(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> TypeDescriptor {
        self.value_type
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongRunningActivityDef {
    activity_type: String,
    output_type: TypeDescriptor,
}

impl LongRunningActivityDef {
    pub fn new<T>(activity_type: impl Into<String>) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            activity_type: activity_type.into(),
            output_type: TypeDescriptor::of::<T>(),
        }
    }

    pub fn activity_type(&self) -> &str {
        &self.activity_type
    }

    pub fn output_type(&self) -> TypeDescriptor {
        self.output_type
    }
}
