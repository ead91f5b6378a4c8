//! State start/decide callbacks driven the way the iWF server drives them.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use iwf_core::{EncodedObject, JsonObjectEncoder, ObjectEncoder};
use iwf_proto as wire;
use iwf_testsuite::fixtures::*;
use iwf_testsuite::init_tracing;
use iwf_worker::{create_router, WorkerError, WorkerOptions, WorkerService};
use iwf_workflow::*;
use serde_json::json;
use tower::ServiceExt;

struct Ping;

#[async_trait]
impl WorkflowState for Ping {
    const STATE_ID: &'static str = "Ping";
    type Input = ();

    async fn decide(
        &self,
        _ctx: &Context,
        _input: &(),
        results: &CommandResults,
        _attributes: &mut Attributes,
        _locals: &mut StateLocals,
    ) -> Result<StateDecision, StateError> {
        if !results.is_empty() {
            return Err(StateError::failed("expected no command results"));
        }
        Ok(StateDecision::graceful_complete_workflow("pong".to_string()))
    }
}

struct PingWorkflow;

impl Workflow for PingWorkflow {
    const WORKFLOW_TYPE: &'static str = "PingWorkflow";

    fn define(&self, builder: WorkflowDefinitionBuilder) -> WorkflowDefinitionBuilder {
        builder.state(StateDef::starting(Ping))
    }
}

struct Stray;

#[async_trait]
impl WorkflowState for Stray {
    const STATE_ID: &'static str = "Stray";
    type Input = ();

    async fn decide(
        &self,
        _ctx: &Context,
        _input: &(),
        _results: &CommandResults,
        _attributes: &mut Attributes,
        _locals: &mut StateLocals,
    ) -> Result<StateDecision, StateError> {
        Ok(StateDecision::single_next_state(StateMovement::new("Nowhere")))
    }
}

struct StrayWorkflow;

impl Workflow for StrayWorkflow {
    const WORKFLOW_TYPE: &'static str = "StrayWorkflow";

    fn define(&self, builder: WorkflowDefinitionBuilder) -> WorkflowDefinitionBuilder {
        builder.state(StateDef::starting(Stray))
    }
}

fn worker() -> WorkerService {
    init_tracing();
    let mut registry = order_registry();
    registry.register(&PingWorkflow).unwrap();
    registry.register(&StrayWorkflow).unwrap();
    WorkerService::new(Arc::new(registry), WorkerOptions::default())
}

fn encode(value: serde_json::Value) -> EncodedObject {
    let encoder: &dyn ObjectEncoder = &JsonObjectEncoder::new();
    encoder.encode(&value).unwrap()
}

fn context() -> wire::Context {
    wire::Context {
        workflow_id: "wf-1".to_string(),
        workflow_run_id: "run-1".to_string(),
        workflow_started_timestamp: 1_700_000_000,
        state_execution_id: Some("Created-1".to_string()),
        attempt: Some(1),
        first_attempt_timestamp: Some(1_700_000_000),
    }
}

fn order_input() -> Option<EncodedObject> {
    Some(encode(json!({ "orderId": "order-1" })))
}

fn start_request(workflow_type: &str, state_id: &str) -> wire::WorkflowStateStartRequest {
    wire::WorkflowStateStartRequest {
        context: context(),
        workflow_type: workflow_type.to_string(),
        workflow_state_id: state_id.to_string(),
        state_input: order_input(),
        search_attributes: None,
        query_attributes: None,
    }
}

fn decide_request(command_results: serde_json::Value) -> wire::WorkflowStateDecideRequest {
    wire::WorkflowStateDecideRequest {
        context: context(),
        workflow_type: ORDER_WORKFLOW_TYPE.to_string(),
        workflow_state_id: "Created".to_string(),
        state_input: order_input(),
        command_results: Some(serde_json::from_value(command_results).unwrap()),
        state_locals: Some(vec![wire::KeyValue::new(
            "orderId",
            Some(encode(json!("order-1"))),
        )]),
        search_attributes: None,
        query_attributes: Some(vec![wire::KeyValue::new(
            ITEM_COUNT_ATTRIBUTE,
            Some(encode(json!(3))),
        )]),
    }
}

#[tokio::test]
async fn test_start_returns_commands_and_locals() {
    let response = worker()
        .handle_workflow_state_start(start_request(ORDER_WORKFLOW_TYPE, "Created"))
        .await
        .unwrap();

    let commands = &response.command_request;
    assert_eq!(
        commands.decider_trigger_type,
        DeciderTriggerType::AnyCommandCompleted
    );
    assert_eq!(
        commands.signal_commands,
        vec![wire::SignalCommand {
            command_id: "cancel-signal".to_string(),
            signal_channel_name: CANCEL_CHANNEL.to_string(),
        }]
    );
    assert_eq!(commands.timer_commands.len(), 1);
    assert_eq!(commands.timer_commands[0].command_id, "ship-timer");

    assert_eq!(
        response.upsert_state_locals,
        Some(vec![wire::KeyValue::new(
            "orderId",
            Some(encode(json!("order-1")))
        )])
    );
    assert!(response.record_events.is_none());
}

#[tokio::test]
async fn test_cancel_signal_fails_the_workflow() {
    let request = decide_request(json!({
        "signalResults": [{
            "commandId": "cancel-signal",
            "signalChannelName": CANCEL_CHANNEL,
            "signalRequestStatus": "RECEIVED",
            "signalValue": { "encoding": "json", "data": "true" }
        }],
        "timerResults": [{ "commandId": "ship-timer", "timerStatus": "SCHEDULED" }]
    }));

    let response = worker().handle_workflow_state_decide(request).await.unwrap();

    let next_states = response.state_decision.next_states.unwrap();
    assert_eq!(next_states.len(), 1);
    assert_eq!(next_states[0].state_id, FORCE_FAILING_WORKFLOW_STATE_ID);
    assert_eq!(next_states[0].next_state_input, Some(encode(json!("order-1"))));
    assert!(next_states[0].next_state_options.is_none());

    assert_eq!(
        response.upsert_query_attributes,
        Some(vec![wire::KeyValue::new(
            STATUS_ATTRIBUTE,
            Some(encode(json!("cancelled")))
        )])
    );
    assert_eq!(
        response.record_events,
        Some(vec![wire::KeyValue::new(
            "cancelled",
            Some(encode(json!("order-1")))
        )])
    );
    assert!(response.upsert_search_attributes.is_none());
}

#[tokio::test]
async fn test_fired_timer_moves_to_shipped_with_registered_options() {
    let request = decide_request(json!({
        "signalResults": [{
            "commandId": "cancel-signal",
            "signalChannelName": CANCEL_CHANNEL,
            "signalRequestStatus": "WAITING"
        }],
        "timerResults": [{ "commandId": "ship-timer", "timerStatus": "FIRED" }]
    }));

    let response = worker().handle_workflow_state_decide(request).await.unwrap();

    let next_states = response.state_decision.next_states.unwrap();
    assert_eq!(next_states.len(), 1);
    let movement = &next_states[0];
    assert_eq!(movement.state_id, "Shipped");
    assert_eq!(movement.next_state_input, order_input());
    let options = movement.next_state_options.as_ref().unwrap();
    assert_eq!(
        options.search_attributes_loading_policy,
        Some(wire::AttributeLoadingType::LoadNone)
    );
    assert_eq!(
        options.query_attributes_loading_policy,
        Some(wire::AttributeLoadingType::LoadAllWithoutLocking)
    );

    assert_eq!(
        response.upsert_query_attributes,
        Some(vec![wire::KeyValue::new(
            STATUS_ATTRIBUTE,
            Some(encode(json!("shipped")))
        )])
    );
    assert_eq!(
        response.upsert_search_attributes,
        Some(vec![wire::SearchAttribute {
            key: CUSTOMER_SEARCH_ATTRIBUTE.to_string(),
            string_value: Some("order-1".to_string()),
            integer_value: None,
            value_type: Some(wire::SearchAttributeValueType::Keyword),
        }])
    );
    assert!(response.record_events.is_none());
}

#[tokio::test]
async fn test_empty_command_request_decides_with_no_results() {
    let worker = worker();
    let mut start = start_request("PingWorkflow", "Ping");
    start.state_input = None;

    let started = worker.handle_workflow_state_start(start).await.unwrap();
    let commands = started.command_request;
    assert_eq!(
        commands.decider_trigger_type,
        DeciderTriggerType::AllCommandCompleted
    );
    assert!(commands.signal_commands.is_empty());
    assert!(commands.timer_commands.is_empty());
    assert!(commands.inter_state_channel_commands.is_empty());
    assert!(commands.long_running_activity_commands.is_empty());

    let decided = worker
        .handle_workflow_state_decide(wire::WorkflowStateDecideRequest {
            context: context(),
            workflow_type: "PingWorkflow".to_string(),
            workflow_state_id: "Ping".to_string(),
            state_input: None,
            command_results: None,
            state_locals: None,
            search_attributes: None,
            query_attributes: None,
        })
        .await
        .unwrap();

    let next_states = decided.state_decision.next_states.unwrap();
    assert_eq!(next_states[0].state_id, GRACEFUL_COMPLETING_WORKFLOW_STATE_ID);
    assert_eq!(next_states[0].next_state_input, Some(encode(json!("pong"))));
}

#[tokio::test]
async fn test_unknown_workflow_and_state_are_not_found() {
    let worker = worker();

    let unregistered = worker
        .handle_workflow_state_start(start_request("RefundWorkflow", "Created"))
        .await
        .unwrap_err();
    assert!(matches!(unregistered, WorkerError::UnregisteredWorkflow(_)));
    assert!(unregistered.is_not_found());

    let unknown_state = worker
        .handle_workflow_state_start(start_request(ORDER_WORKFLOW_TYPE, "Delivered"))
        .await
        .unwrap_err();
    assert!(matches!(unknown_state, WorkerError::UnknownState { .. }));
}

#[tokio::test]
async fn test_undecodable_input_is_encoding_error() {
    let mut request = start_request(ORDER_WORKFLOW_TYPE, "Created");
    request.state_input = Some(encode(json!(42)));

    let err = worker()
        .handle_workflow_state_start(request)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Encoding(_)));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_router_serves_start_callback() {
    let app = create_router(Arc::new(worker()));
    let body = serde_json::to_string(&start_request(ORDER_WORKFLOW_TYPE, "Created")).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(wire::WORKFLOW_STATE_START_API_PATH)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let started: wire::WorkflowStateStartResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(started.command_request.signal_commands.len(), 1);
}

#[tokio::test]
async fn test_router_maps_unknown_state_to_not_found() {
    let app = create_router(Arc::new(worker()));
    let body = serde_json::to_string(&start_request(ORDER_WORKFLOW_TYPE, "Delivered")).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(wire::WORKFLOW_STATE_START_API_PATH)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error["errorType"], "not-found");
}

fn stray_decide_request() -> wire::WorkflowStateDecideRequest {
    wire::WorkflowStateDecideRequest {
        context: context(),
        workflow_type: "StrayWorkflow".to_string(),
        workflow_state_id: "Stray".to_string(),
        state_input: None,
        command_results: None,
        state_locals: None,
        search_attributes: None,
        query_attributes: None,
    }
}

#[tokio::test]
async fn test_decision_to_unregistered_state_is_a_state_failure() {
    let err = worker()
        .handle_workflow_state_decide(stray_decide_request())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkerError::UnknownTargetState { ref state_id, .. } if state_id == "Nowhere"
    ));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_router_maps_unregistered_target_state_to_server_error() {
    let app = create_router(Arc::new(worker()));
    let body = serde_json::to_string(&stray_decide_request()).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(wire::WORKFLOW_STATE_DECIDE_API_PATH)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error["errorType"], "state-api-error");
}
