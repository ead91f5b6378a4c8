//! Typed client.
//!
//! Every operation resolves the workflow type from `W::WORKFLOW_TYPE`,
//! validates the call against the [`Registry`] and only then hands an encoded
//! request to the [`UntypedClient`]. A call that fails validation never
//! reaches the transport.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use iwf_core::DynValue;
use iwf_proto::workflow_service::{StateCompletionOutput, WorkflowSearchResponse, WorkflowService};
use iwf_proto::SearchAttributeKeyAndType;
use iwf_workflow::{Registry, SearchAttributeType, SearchAttributeValue, Workflow};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult, ValidationError};
use crate::options::{ClientOptions, ResetWorkflowRequest, WorkflowStartOptions};
use crate::untyped::UntypedClient;

/// Registry-aware client for iWF workflows
#[derive(Debug, Clone)]
pub struct Client {
    registry: Arc<Registry>,
    untyped: UntypedClient,
}

impl Client {
    /// Client talking HTTP to `options.server_url`
    pub fn new(registry: Arc<Registry>, options: ClientOptions) -> ClientResult<Self> {
        Ok(Self {
            registry,
            untyped: UntypedClient::new(options)?,
        })
    }

    /// Client over an existing service implementation
    pub fn with_service(
        registry: Arc<Registry>,
        service: Arc<dyn WorkflowService>,
        options: ClientOptions,
    ) -> Self {
        Self {
            registry,
            untyped: UntypedClient::with_service(service, options),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn untyped(&self) -> &UntypedClient {
        &self.untyped
    }

    pub fn options(&self) -> &ClientOptions {
        self.untyped.options()
    }

    /// Start `W` at `start_state_id` and return the run id.
    ///
    /// The state must be registered, must be allowed to start the workflow,
    /// and must take `I` as input. Use `&()` for states without input.
    pub async fn start_workflow<W, I>(
        &self,
        start_state_id: &str,
        input: &I,
        workflow_id: &str,
        options: &WorkflowStartOptions,
    ) -> ClientResult<String>
    where
        W: Workflow,
        I: Serialize + Any,
    {
        let workflow_type = W::WORKFLOW_TYPE;
        let state = self
            .registry
            .workflow_state(workflow_type, start_state_id)
            .filter(|state| state.can_start_workflow())
            .ok_or_else(|| ValidationError::InvalidStartState {
                workflow_type: workflow_type.to_string(),
                state_id: start_state_id.to_string(),
            })?;

        let expected = state.input_type();
        if !expected.is_instance_of::<I>() {
            return Err(ValidationError::StateInputTypeMismatch {
                state_id: start_state_id.to_string(),
                expected: expected.type_name(),
                actual: std::any::type_name::<I>(),
            }
            .into());
        }

        let state_input = self.options().object_encoder.encode(input)?;
        self.untyped
            .start_workflow(
                workflow_type,
                start_state_id,
                Some(state_input),
                workflow_id,
                options,
            )
            .await
    }

    /// Signal a running `W` on one of its declared channels
    pub async fn signal_workflow<W, T>(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
        channel: &str,
        value: &T,
    ) -> ClientResult<()>
    where
        W: Workflow,
        T: Serialize + Any,
    {
        let workflow_type = W::WORKFLOW_TYPE;
        let channels = self
            .registry
            .signal_channel_types(workflow_type)
            .ok_or_else(|| ValidationError::UnregisteredWorkflow(workflow_type.to_string()))?;
        let declared = channels
            .get(channel)
            .ok_or_else(|| ValidationError::UnknownSignalChannel {
                workflow_type: workflow_type.to_string(),
                channel: channel.to_string(),
            })?;
        if declared.type_id() != TypeId::of::<T>() {
            return Err(ValidationError::SignalTypeMismatch {
                channel: channel.to_string(),
                expected: declared.type_name(),
                actual: std::any::type_name::<T>(),
            }
            .into());
        }

        let encoded = self.options().object_encoder.encode(value)?;
        self.untyped
            .signal_workflow(workflow_id, workflow_run_id, channel, Some(encoded))
            .await
    }

    /// Single completion output of a workflow, decoded as `T`
    pub async fn get_simple_workflow_result_with_wait<T: DeserializeOwned>(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
    ) -> ClientResult<Option<T>> {
        let output = self
            .untyped
            .get_simple_workflow_result_with_wait(workflow_id, workflow_run_id)
            .await?;
        match output {
            Some(encoded) => Ok(Some(self.options().object_encoder.decode(&encoded)?)),
            None => Ok(None),
        }
    }

    /// Every completion output; decoding is left to the caller
    pub async fn get_complex_workflow_result_with_wait(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
    ) -> ClientResult<Vec<StateCompletionOutput>> {
        self.untyped
            .get_complex_workflow_result_with_wait(workflow_id, workflow_run_id)
            .await
    }

    pub async fn reset_workflow(&self, request: ResetWorkflowRequest) -> ClientResult<String> {
        self.untyped.reset_workflow(request).await
    }

    pub async fn cancel_workflow(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
    ) -> ClientResult<()> {
        self.untyped.cancel_workflow(workflow_id, workflow_run_id).await
    }

    pub async fn search_workflow(
        &self,
        query: &str,
        page_size: i32,
    ) -> ClientResult<WorkflowSearchResponse> {
        self.untyped.search_workflow(query, page_size).await
    }

    /// Selected query attributes of `W`; `keys` must not be empty
    pub async fn get_workflow_query_attributes<W: Workflow>(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
        keys: &[&str],
    ) -> ClientResult<HashMap<String, DynValue>> {
        if keys.is_empty() {
            return Err(ValidationError::EmptyAttributeKeys.into());
        }
        self.query_attributes::<W>(workflow_id, workflow_run_id, Some(keys))
            .await
    }

    /// Every query attribute of `W` that currently has a value
    pub async fn get_all_query_attributes<W: Workflow>(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
    ) -> ClientResult<HashMap<String, DynValue>> {
        self.query_attributes::<W>(workflow_id, workflow_run_id, None)
            .await
    }

    async fn query_attributes<W: Workflow>(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
        keys: Option<&[&str]>,
    ) -> ClientResult<HashMap<String, DynValue>> {
        let workflow_type = W::WORKFLOW_TYPE;
        let types = self
            .registry
            .query_attribute_types(workflow_type)
            .ok_or_else(|| ValidationError::UnregisteredWorkflow(workflow_type.to_string()))?;
        if let Some(keys) = keys {
            check_known_keys("Query", keys, |key| types.contains_key(key))?;
        }

        let attributes = self
            .untyped
            .get_query_attributes(
                workflow_id,
                workflow_run_id,
                keys.map(|keys| keys.iter().map(|k| k.to_string()).collect()),
            )
            .await?;

        let encoder = self.options().object_encoder.as_ref();
        let mut result = HashMap::with_capacity(attributes.len());
        for attribute in attributes {
            let Some(value) = attribute.value else {
                continue;
            };
            let descriptor = types.get(&attribute.key).ok_or_else(|| {
                ClientError::server_contract_violation(format!(
                    "undeclared query attribute {}",
                    attribute.key
                ))
            })?;
            result.insert(attribute.key, descriptor.decode(encoder, &value)?);
        }
        debug!(
            workflow_type = %workflow_type,
            workflow_id = %workflow_id,
            count = result.len(),
            "Fetched query attributes"
        );
        Ok(result)
    }

    /// Selected search attributes of `W`; `keys` must not be empty
    pub async fn get_workflow_search_attributes<W: Workflow>(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
        keys: &[&str],
    ) -> ClientResult<HashMap<String, SearchAttributeValue>> {
        if keys.is_empty() {
            return Err(ValidationError::EmptyAttributeKeys.into());
        }
        self.search_attributes::<W>(workflow_id, workflow_run_id, Some(keys))
            .await
    }

    /// Every declared search attribute of `W` that currently has a value
    pub async fn get_all_search_attributes<W: Workflow>(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
    ) -> ClientResult<HashMap<String, SearchAttributeValue>> {
        self.search_attributes::<W>(workflow_id, workflow_run_id, None)
            .await
    }

    async fn search_attributes<W: Workflow>(
        &self,
        workflow_id: &str,
        workflow_run_id: Option<&str>,
        keys: Option<&[&str]>,
    ) -> ClientResult<HashMap<String, SearchAttributeValue>> {
        let workflow_type = W::WORKFLOW_TYPE;
        let types = self
            .registry
            .search_attribute_types(workflow_type)
            .ok_or_else(|| ValidationError::UnregisteredWorkflow(workflow_type.to_string()))?;

        let key_and_types = match keys {
            Some(keys) => {
                check_known_keys("Search", keys, |key| types.contains_key(key))?;
                keys.iter()
                    .filter_map(|key| types.get(*key).map(|t| key_and_type(key, *t)))
                    .collect()
            }
            None => {
                let mut all: Vec<_> = types.iter().map(|(k, t)| key_and_type(k, *t)).collect();
                all.sort_by(|a, b| a.key.cmp(&b.key));
                all
            }
        };

        let attributes = self
            .untyped
            .get_search_attributes(workflow_id, workflow_run_id, key_and_types)
            .await?;

        let mut result = HashMap::with_capacity(attributes.len());
        for attribute in &attributes {
            let Some(declared) = types.get(&attribute.key) else {
                warn!(
                    workflow_type = %workflow_type,
                    key = %attribute.key,
                    "Ignoring undeclared search attribute"
                );
                continue;
            };
            if let Some(value) = SearchAttributeValue::from_wire(attribute, *declared) {
                result.insert(attribute.key.clone(), value);
            }
        }
        Ok(result)
    }
}

fn key_and_type(key: &str, value_type: SearchAttributeType) -> SearchAttributeKeyAndType {
    SearchAttributeKeyAndType {
        key: key.to_string(),
        value_type: value_type.into(),
    }
}

fn check_known_keys(
    kind: &'static str,
    keys: &[&str],
    is_known: impl Fn(&str) -> bool,
) -> Result<(), ValidationError> {
    let unknown: Vec<String> = keys
        .iter()
        .filter(|key| !is_known(**key))
        .map(|key| key.to_string())
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::UnknownAttributeKeys {
            kind,
            keys: unknown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_known_keys_lists_every_unknown_key() {
        let known = ["status"];
        let err = check_known_keys("Query", &["status", "a", "b"], |k| known.contains(&k))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownAttributeKeys {
                kind: "Query",
                keys: vec!["a".to_string(), "b".to_string()],
            }
        );
        assert!(check_known_keys("Query", &["status"], |k| known.contains(&k)).is_ok());
    }
}
