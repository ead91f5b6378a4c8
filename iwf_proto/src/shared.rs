//! Types shared by the server API and the worker callback API.

use iwf_core::EncodedObject;
use serde::{Deserialize, Serialize};

/// Key with an optional encoded value (query attributes, state locals, events)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValue {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<EncodedObject>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: Option<EncodedObject>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Value type of a search attribute as indexed by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchAttributeValueType {
    Keyword,
    Text,
    Int,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAttributeKeyAndType {
    pub key: String,
    pub value_type: SearchAttributeValueType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAttribute {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integer_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<SearchAttributeValueType>,
}

/// Execution context of a state API call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub workflow_id: String,
    pub workflow_run_id: String,
    pub workflow_started_timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_execution_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_attempt_timestamp: Option<i64>,
}

// ============================================================================
// Command Request
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeciderTriggerType {
    AllCommandCompleted,
    AnyCommandCompleted,
    AnyCommandClosed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalCommand {
    pub command_id: String,
    pub signal_channel_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerCommand {
    pub command_id: String,
    pub firing_unix_timestamp_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterStateChannelCommand {
    pub command_id: String,
    pub channel_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_to_close_timeout_seconds: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_timeout_seconds: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_attempts: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongRunningActivityCommand {
    pub command_id: String,
    pub activity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<EncodedObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_options: Option<ActivityOptions>,
}

/// Commands requested by a state's start phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    /// Always serialized, even when no command is requested
    pub decider_trigger_type: DeciderTriggerType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signal_commands: Vec<SignalCommand>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timer_commands: Vec<TimerCommand>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inter_state_channel_commands: Vec<InterStateChannelCommand>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub long_running_activity_commands: Vec<LongRunningActivityCommand>,
}

// ============================================================================
// Command Results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelRequestStatus {
    Waiting,
    Received,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerStatus {
    Scheduled,
    Fired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityStatus {
    Completed,
    Failed,
    TimedOut,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalResult {
    pub command_id: String,
    pub signal_channel_name: String,
    pub signal_request_status: ChannelRequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_value: Option<EncodedObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerResult {
    pub command_id: String,
    pub timer_status: TimerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterStateChannelResult {
    pub command_id: String,
    pub channel_name: String,
    pub request_status: ChannelRequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<EncodedObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongRunningActivityResult {
    pub command_id: String,
    pub activity_type: String,
    pub activity_status: ActivityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<EncodedObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Results of the commands requested by the start phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_results: Option<Vec<SignalResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_results: Option<Vec<TimerResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inter_state_channel_results: Option<Vec<InterStateChannelResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_running_activity_results: Option<Vec<LongRunningActivityResult>>,
}

// ============================================================================
// State Decision
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeLoadingType {
    LoadAllWithoutLocking,
    LoadNone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandCarryOverType {
    None,
    CarryOverAll,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_attributes_loading_policy: Option<AttributeLoadingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_attributes_loading_policy: Option<AttributeLoadingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_carry_over_policy: Option<CommandCarryOverType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMovement {
    pub state_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_state_input: Option<EncodedObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_state_options: Option<WorkflowStateOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDecision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_states: Option<Vec<StateMovement>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_command_request_keeps_trigger_type() {
        let request = CommandRequest {
            decider_trigger_type: DeciderTriggerType::AllCommandCompleted,
            signal_commands: vec![],
            timer_commands: vec![],
            inter_state_channel_commands: vec![],
            long_running_activity_commands: vec![],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({ "deciderTriggerType": "ALL_COMMAND_COMPLETED" })
        );
    }

    #[test]
    fn test_command_results_accepts_missing_lists() {
        let results: CommandResults = serde_json::from_value(json!({
            "timerResults": [{ "commandId": "t1", "timerStatus": "FIRED" }]
        }))
        .unwrap();

        assert!(results.signal_results.is_none());
        assert_eq!(
            results.timer_results.unwrap()[0].timer_status,
            TimerStatus::Fired
        );
    }

    #[test]
    fn test_search_attribute_value_type_names() {
        let key_and_type = SearchAttributeKeyAndType {
            key: "CustomIntField".to_string(),
            value_type: SearchAttributeValueType::Int,
        };
        assert_eq!(
            serde_json::to_value(&key_and_type).unwrap(),
            json!({ "key": "CustomIntField", "valueType": "INT" })
        );
    }
}
