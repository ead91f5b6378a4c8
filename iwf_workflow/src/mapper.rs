//! Conversions between the authoring model and the wire types.
//!
//! Payloads on the wire carry no type; decoding looks the type up by channel
//! name or activity type in the tables built at registration.

use std::collections::HashMap;

use iwf_core::{DynValue, EncodedObject, EncodingError, ObjectEncoder, TypeDescriptor};
use iwf_proto::shared as wire;

use crate::command::{
    BaseCommand, CommandRequest, CommandResults, InterStateChannelCommandResult,
    LongRunningActivityCommandResult, SignalCommandResult, TimerCommandResult,
};
use crate::decision::{StateDecision, StateMovement};

fn decode_named(
    kind: &str,
    name: &str,
    types: &HashMap<String, TypeDescriptor>,
    encoded: Option<&EncodedObject>,
    encoder: &dyn ObjectEncoder,
) -> Result<Option<DynValue>, EncodingError> {
    let Some(encoded) = encoded else {
        return Ok(None);
    };
    let value_type = types
        .get(name)
        .ok_or_else(|| EncodingError::UnknownType(format!("{} {}", kind, name)))?;
    value_type.decode(encoder, encoded).map(Some)
}

/// Decode command results sent by the server.
///
/// Missing results map to empty [`CommandResults`]. A payload under a name
/// missing from its table fails with [`EncodingError::UnknownType`].
pub fn command_results_from_wire(
    results: Option<&wire::CommandResults>,
    signal_types: &HashMap<String, TypeDescriptor>,
    inter_state_channel_types: &HashMap<String, TypeDescriptor>,
    activity_types: &HashMap<String, TypeDescriptor>,
    encoder: &dyn ObjectEncoder,
) -> Result<CommandResults, EncodingError> {
    let Some(results) = results else {
        return Ok(CommandResults::default());
    };

    let signal_results = results
        .signal_results
        .iter()
        .flatten()
        .map(|result| {
            Ok(SignalCommandResult {
                command_id: result.command_id.clone(),
                channel_name: result.signal_channel_name.clone(),
                status: result.signal_request_status,
                value: decode_named(
                    "signal channel",
                    &result.signal_channel_name,
                    signal_types,
                    result.signal_value.as_ref(),
                    encoder,
                )?,
            })
        })
        .collect::<Result<Vec<_>, EncodingError>>()?;

    let timer_results = results
        .timer_results
        .iter()
        .flatten()
        .map(|result| TimerCommandResult {
            command_id: result.command_id.clone(),
            status: result.timer_status,
        })
        .collect();

    let inter_state_channel_results = results
        .inter_state_channel_results
        .iter()
        .flatten()
        .map(|result| {
            Ok(InterStateChannelCommandResult {
                command_id: result.command_id.clone(),
                channel_name: result.channel_name.clone(),
                status: result.request_status,
                value: decode_named(
                    "inter-state channel",
                    &result.channel_name,
                    inter_state_channel_types,
                    result.value.as_ref(),
                    encoder,
                )?,
            })
        })
        .collect::<Result<Vec<_>, EncodingError>>()?;

    let long_running_activity_results = results
        .long_running_activity_results
        .iter()
        .flatten()
        .map(|result| {
            Ok(LongRunningActivityCommandResult {
                command_id: result.command_id.clone(),
                activity_type: result.activity_type.clone(),
                status: result.activity_status,
                output: decode_named(
                    "activity type",
                    &result.activity_type,
                    activity_types,
                    result.output.as_ref(),
                    encoder,
                )?,
                failure_reason: result.failure_reason.clone(),
            })
        })
        .collect::<Result<Vec<_>, EncodingError>>()?;

    Ok(CommandResults {
        signal_results,
        timer_results,
        inter_state_channel_results,
        long_running_activity_results,
    })
}

pub fn command_request_to_wire(
    request: &CommandRequest,
    encoder: &dyn ObjectEncoder,
) -> Result<wire::CommandRequest, EncodingError> {
    let mut wire_request = wire::CommandRequest {
        decider_trigger_type: request.decider_trigger_type(),
        signal_commands: Vec::new(),
        timer_commands: Vec::new(),
        inter_state_channel_commands: Vec::new(),
        long_running_activity_commands: Vec::new(),
    };

    for command in request.commands() {
        match command {
            BaseCommand::Signal(command) => wire_request.signal_commands.push(wire::SignalCommand {
                command_id: command.command_id.clone(),
                signal_channel_name: command.channel_name.clone(),
            }),
            BaseCommand::Timer(command) => wire_request.timer_commands.push(wire::TimerCommand {
                command_id: command.command_id.clone(),
                firing_unix_timestamp_seconds: command.firing_unix_timestamp_seconds,
            }),
            BaseCommand::InterStateChannel(command) => {
                wire_request
                    .inter_state_channel_commands
                    .push(wire::InterStateChannelCommand {
                        command_id: command.command_id.clone(),
                        channel_name: command.channel_name.clone(),
                    })
            }
            BaseCommand::LongRunningActivity(command) => {
                let input = command
                    .input
                    .as_ref()
                    .map(|input| input.encode(encoder))
                    .transpose()?;
                wire_request
                    .long_running_activity_commands
                    .push(wire::LongRunningActivityCommand {
                        command_id: command.command_id.clone(),
                        activity_type: command.activity_type.clone(),
                        input,
                        activity_options: command.options.clone(),
                    })
            }
        }
    }

    Ok(wire_request)
}

pub fn state_movement_to_wire(
    movement: &StateMovement,
    encoder: &dyn ObjectEncoder,
) -> Result<wire::StateMovement, EncodingError> {
    Ok(wire::StateMovement {
        state_id: movement.state_id.clone(),
        next_state_input: movement
            .input
            .as_ref()
            .map(|input| input.encode(encoder))
            .transpose()?,
        next_state_options: movement.options.as_ref().map(|options| options.to_wire()),
    })
}

/// An empty decision maps to a decision without next states
pub fn state_decision_to_wire(
    decision: &StateDecision,
    encoder: &dyn ObjectEncoder,
) -> Result<wire::StateDecision, EncodingError> {
    if decision.next_states().is_empty() {
        return Ok(wire::StateDecision { next_states: None });
    }

    let next_states = decision
        .next_states()
        .iter()
        .map(|movement| state_movement_to_wire(movement, encoder))
        .collect::<Result<Vec<_>, EncodingError>>()?;
    Ok(wire::StateDecision {
        next_states: Some(next_states),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{
        ActivityStatus, ChannelRequestStatus, LongRunningActivityCommand, SignalCommand,
        TimerCommand, TimerStatus,
    };
    use crate::decision::GRACEFUL_COMPLETING_WORKFLOW_STATE_ID;
    use iwf_core::JsonObjectEncoder;
    use serde_json::json;

    fn signal_types() -> HashMap<String, TypeDescriptor> {
        HashMap::from([("cancel".to_string(), TypeDescriptor::of::<bool>())])
    }

    fn wire_results(value: serde_json::Value) -> wire::CommandResults {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_absent_results_map_to_empty() {
        let encoder = JsonObjectEncoder::new();
        let results = command_results_from_wire(
            None,
            &signal_types(),
            &HashMap::new(),
            &HashMap::new(),
            &encoder,
        )
        .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_signal_value_decoded_with_channel_type() {
        let encoder = JsonObjectEncoder::new();
        let wire = wire_results(json!({
            "signalResults": [{
                "commandId": "s1",
                "signalChannelName": "cancel",
                "signalRequestStatus": "RECEIVED",
                "signalValue": { "encoding": "json", "data": "true" }
            }],
            "timerResults": [{ "commandId": "t1", "timerStatus": "SCHEDULED" }]
        }));

        let results = command_results_from_wire(
            Some(&wire),
            &signal_types(),
            &HashMap::new(),
            &HashMap::new(),
            &encoder,
        )
        .unwrap();

        let signal = &results.signal_results[0];
        assert_eq!(signal.status, ChannelRequestStatus::Received);
        assert_eq!(signal.value::<bool>(), Some(&true));
        assert_eq!(results.timer_results[0].status, TimerStatus::Scheduled);
    }

    #[test]
    fn test_waiting_signal_without_value() {
        let encoder = JsonObjectEncoder::new();
        let wire = wire_results(json!({
            "signalResults": [{
                "commandId": "s1",
                "signalChannelName": "not-declared",
                "signalRequestStatus": "WAITING"
            }]
        }));

        let results = command_results_from_wire(
            Some(&wire),
            &signal_types(),
            &HashMap::new(),
            &HashMap::new(),
            &encoder,
        )
        .unwrap();
        assert!(results.signal_results[0].value.is_none());
    }

    #[test]
    fn test_value_for_unknown_channel_fails() {
        let encoder = JsonObjectEncoder::new();
        let wire = wire_results(json!({
            "interStateChannelResults": [{
                "commandId": "c1",
                "channelName": "handoff",
                "requestStatus": "RECEIVED",
                "value": { "encoding": "json", "data": "1" }
            }]
        }));

        let err = command_results_from_wire(
            Some(&wire),
            &signal_types(),
            &HashMap::new(),
            &HashMap::new(),
            &encoder,
        )
        .unwrap_err();
        assert_eq!(
            err,
            EncodingError::UnknownType("inter-state channel handoff".to_string())
        );
    }

    #[test]
    fn test_activity_output_decoded_with_activity_type() {
        let encoder = JsonObjectEncoder::new();
        let activity_types =
            HashMap::from([("charge".to_string(), TypeDescriptor::of::<String>())]);
        let wire = wire_results(json!({
            "longRunningActivityResults": [{
                "commandId": "a1",
                "activityType": "charge",
                "activityStatus": "COMPLETED",
                "output": { "encoding": "json", "data": "\"receipt-1\"" }
            }]
        }));

        let results = command_results_from_wire(
            Some(&wire),
            &HashMap::new(),
            &HashMap::new(),
            &activity_types,
            &encoder,
        )
        .unwrap();
        let result = results.long_running_activity_result("a1").unwrap();
        assert_eq!(result.status, ActivityStatus::Completed);
        assert_eq!(result.output::<String>(), Some(&"receipt-1".to_string()));
    }

    #[test]
    fn test_command_request_to_wire() {
        let encoder = JsonObjectEncoder::new();
        let request = CommandRequest::for_all_command_completed([
            BaseCommand::from(SignalCommand::new("s1", "cancel")),
            BaseCommand::from(TimerCommand::new("t1", 1_700_000_000)),
            BaseCommand::from(LongRunningActivityCommand::new("a1", "charge").with_input(12i64)),
        ]);

        let wire = command_request_to_wire(&request, &encoder).unwrap();
        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            json!({
                "deciderTriggerType": "ALL_COMMAND_COMPLETED",
                "signalCommands": [{ "commandId": "s1", "signalChannelName": "cancel" }],
                "timerCommands": [{ "commandId": "t1", "firingUnixTimestampSeconds": 1_700_000_000 }],
                "longRunningActivityCommands": [{
                    "commandId": "a1",
                    "activityType": "charge",
                    "input": { "encoding": "json", "data": "12" }
                }]
            })
        );
    }

    #[test]
    fn test_empty_command_request_to_wire() {
        let encoder = JsonObjectEncoder::new();
        let wire = command_request_to_wire(&CommandRequest::empty(), &encoder).unwrap();
        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            json!({ "deciderTriggerType": "ALL_COMMAND_COMPLETED" })
        );
    }

    #[test]
    fn test_state_decision_to_wire() {
        let encoder = JsonObjectEncoder::new();
        let decision = StateDecision::graceful_complete_workflow("done".to_string());

        let wire = state_decision_to_wire(&decision, &encoder).unwrap();
        let next_states = wire.next_states.unwrap();
        assert_eq!(next_states[0].state_id, GRACEFUL_COMPLETING_WORKFLOW_STATE_ID);
        assert_eq!(
            next_states[0].next_state_input.as_ref().unwrap().data(),
            "\"done\""
        );
        assert!(next_states[0].next_state_options.is_none());

        let empty = StateDecision::multiple_next_states(Vec::new());
        assert!(state_decision_to_wire(&empty, &encoder)
            .unwrap()
            .next_states
            .is_none());
    }
}
