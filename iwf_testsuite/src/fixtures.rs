//! Sample workflow used across the test suites.
//!
//! `OrderWorkflow` starts at `Created`, waits for a `cancel` signal or a
//! one hour timer, then either fails the workflow or moves to `Shipped`,
//! which completes it with the order id.

use std::time::Duration;

use async_trait::async_trait;
use iwf_workflow::*;
use serde::{Deserialize, Serialize};

pub const ORDER_WORKFLOW_TYPE: &str = "OrderWorkflow";
pub const CANCEL_CHANNEL: &str = "cancel";
pub const STATUS_ATTRIBUTE: &str = "status";
pub const ITEM_COUNT_ATTRIBUTE: &str = "itemCount";
pub const CUSTOMER_SEARCH_ATTRIBUTE: &str = "CustomKeywordField";
pub const AMOUNT_SEARCH_ATTRIBUTE: &str = "CustomIntField";
pub const NOTES_SEARCH_ATTRIBUTE: &str = "CustomTextField";

const CANCEL_COMMAND_ID: &str = "cancel-signal";
const SHIP_TIMER_COMMAND_ID: &str = "ship-timer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub order_id: String,
}

impl OrderInput {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
        }
    }
}

pub struct Created;

#[async_trait]
impl WorkflowState for Created {
    const STATE_ID: &'static str = "Created";
    type Input = OrderInput;

    async fn start(
        &self,
        _ctx: &Context,
        input: &OrderInput,
        _attributes: &Attributes,
        locals: &mut StateLocals,
    ) -> Result<CommandRequest, StateError> {
        locals.set_local_attribute("orderId", &input.order_id)?;
        Ok(CommandRequest::for_any_command_completed([
            BaseCommand::from(SignalCommand::new(CANCEL_COMMAND_ID, CANCEL_CHANNEL)),
            BaseCommand::from(TimerCommand::by_duration(
                SHIP_TIMER_COMMAND_ID,
                Duration::from_secs(3600),
            )),
        ]))
    }

    async fn decide(
        &self,
        _ctx: &Context,
        input: &OrderInput,
        results: &CommandResults,
        attributes: &mut Attributes,
        locals: &mut StateLocals,
    ) -> Result<StateDecision, StateError> {
        let cancelled = results
            .signal_result(CANCEL_COMMAND_ID)
            .and_then(|result| result.value::<bool>())
            .copied()
            .unwrap_or(false);

        if cancelled {
            attributes
                .query
                .set(STATUS_ATTRIBUTE, "cancelled".to_string())?;
            locals.record_event("cancelled", &input.order_id)?;
            return Ok(StateDecision::force_fail_workflow(input.order_id.clone()));
        }

        attributes.query.set(STATUS_ATTRIBUTE, "shipped".to_string())?;
        attributes
            .search
            .set_keyword(CUSTOMER_SEARCH_ATTRIBUTE, input.order_id.clone())?;
        Ok(StateDecision::single_next_state(StateMovement::with_input(
            Shipped::STATE_ID,
            input.clone(),
        )))
    }
}

pub struct Shipped;

#[async_trait]
impl WorkflowState for Shipped {
    const STATE_ID: &'static str = "Shipped";
    type Input = OrderInput;

    fn options(&self) -> StateOptions {
        StateOptions {
            search_attributes_loading_policy: AttributeLoadingPolicy::LoadNone,
            ..StateOptions::default()
        }
    }

    async fn decide(
        &self,
        _ctx: &Context,
        input: &OrderInput,
        _results: &CommandResults,
        _attributes: &mut Attributes,
        _locals: &mut StateLocals,
    ) -> Result<StateDecision, StateError> {
        Ok(StateDecision::graceful_complete_workflow(
            input.order_id.clone(),
        ))
    }
}

pub struct OrderWorkflow;

impl Workflow for OrderWorkflow {
    const WORKFLOW_TYPE: &'static str = ORDER_WORKFLOW_TYPE;

    fn define(&self, builder: WorkflowDefinitionBuilder) -> WorkflowDefinitionBuilder {
        builder
            .state(StateDef::starting(Created))
            .state(StateDef::non_starting(Shipped))
            .signal_channel::<bool>(CANCEL_CHANNEL)
            .query_attribute::<String>(STATUS_ATTRIBUTE)
            .query_attribute::<i64>(ITEM_COUNT_ATTRIBUTE)
            .search_attribute(CUSTOMER_SEARCH_ATTRIBUTE, SearchAttributeType::Keyword)
            .search_attribute(AMOUNT_SEARCH_ATTRIBUTE, SearchAttributeType::Int64)
            .search_attribute(NOTES_SEARCH_ATTRIBUTE, SearchAttributeType::Text)
    }
}

/// Registry holding only [`OrderWorkflow`]
pub fn order_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(&OrderWorkflow)
        .expect("a fresh registry accepts the order workflow");
    registry
}
