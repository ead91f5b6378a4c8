//! Commands requested by a state's start phase, and their results.

use std::any::Any;
use std::time::Duration;

use chrono::{DateTime, Utc};
use iwf_core::DynValue;
use serde::{de::DeserializeOwned, Serialize};

pub use iwf_proto::shared::{
    ActivityOptions, ActivityStatus, ChannelRequestStatus, DeciderTriggerType, TimerStatus,
};

/// Wait for a value on a signal channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalCommand {
    pub command_id: String,
    pub channel_name: String,
}

impl SignalCommand {
    pub fn new(command_id: impl Into<String>, channel_name: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            channel_name: channel_name.into(),
        }
    }

    /// Signal command without a command id
    pub fn for_channel(channel_name: impl Into<String>) -> Self {
        Self::new("", channel_name)
    }
}

/// Wait until a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerCommand {
    pub command_id: String,
    pub firing_unix_timestamp_seconds: i64,
}

impl TimerCommand {
    pub fn new(command_id: impl Into<String>, firing_unix_timestamp_seconds: i64) -> Self {
        Self {
            command_id: command_id.into(),
            firing_unix_timestamp_seconds,
        }
    }

    /// Fire `duration` from now
    pub fn by_duration(command_id: impl Into<String>, duration: Duration) -> Self {
        let seconds = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        Self::new(command_id, Utc::now().timestamp().saturating_add(seconds))
    }

    pub fn at(command_id: impl Into<String>, instant: DateTime<Utc>) -> Self {
        Self::new(command_id, instant.timestamp())
    }
}

/// Wait for a value published by another state of the same run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterStateChannelCommand {
    pub command_id: String,
    pub channel_name: String,
}

impl InterStateChannelCommand {
    pub fn new(command_id: impl Into<String>, channel_name: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            channel_name: channel_name.into(),
        }
    }
}

/// Run an activity whose output is declared on the workflow definition
#[derive(Debug)]
pub struct LongRunningActivityCommand {
    pub command_id: String,
    pub activity_type: String,
    pub input: Option<DynValue>,
    pub options: Option<ActivityOptions>,
}

impl LongRunningActivityCommand {
    pub fn new(command_id: impl Into<String>, activity_type: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            activity_type: activity_type.into(),
            input: None,
            options: None,
        }
    }

    pub fn with_input<T>(mut self, input: T) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.input = Some(DynValue::new(input));
        self
    }

    pub fn with_options(mut self, options: ActivityOptions) -> Self {
        self.options = Some(options);
        self
    }
}

#[derive(Debug)]
pub enum BaseCommand {
    Signal(SignalCommand),
    Timer(TimerCommand),
    InterStateChannel(InterStateChannelCommand),
    LongRunningActivity(LongRunningActivityCommand),
}

impl From<SignalCommand> for BaseCommand {
    fn from(command: SignalCommand) -> Self {
        BaseCommand::Signal(command)
    }
}

impl From<TimerCommand> for BaseCommand {
    fn from(command: TimerCommand) -> Self {
        BaseCommand::Timer(command)
    }
}

impl From<InterStateChannelCommand> for BaseCommand {
    fn from(command: InterStateChannelCommand) -> Self {
        BaseCommand::InterStateChannel(command)
    }
}

impl From<LongRunningActivityCommand> for BaseCommand {
    fn from(command: LongRunningActivityCommand) -> Self {
        BaseCommand::LongRunningActivity(command)
    }
}

/// Commands to wait for, and when `decide` should run.
///
/// With no commands the server goes straight to `decide`; the trigger type is
/// still sent because the server requires one.
#[derive(Debug)]
pub struct CommandRequest {
    commands: Vec<BaseCommand>,
    decider_trigger_type: DeciderTriggerType,
}

impl CommandRequest {
    pub fn empty() -> Self {
        Self {
            commands: Vec::new(),
            decider_trigger_type: DeciderTriggerType::AllCommandCompleted,
        }
    }

    /// Decide after every command completed
    pub fn for_all_command_completed<I>(commands: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<BaseCommand>,
    {
        Self::with_trigger(commands, DeciderTriggerType::AllCommandCompleted)
    }

    /// Decide after the first command completed
    pub fn for_any_command_completed<I>(commands: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<BaseCommand>,
    {
        Self::with_trigger(commands, DeciderTriggerType::AnyCommandCompleted)
    }

    /// Decide after the first command completed, failed or was canceled
    pub fn for_any_command_closed<I>(commands: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<BaseCommand>,
    {
        Self::with_trigger(commands, DeciderTriggerType::AnyCommandClosed)
    }

    fn with_trigger<I>(commands: I, decider_trigger_type: DeciderTriggerType) -> Self
    where
        I: IntoIterator,
        I::Item: Into<BaseCommand>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            decider_trigger_type,
        }
    }

    pub fn commands(&self) -> &[BaseCommand] {
        &self.commands
    }

    pub fn decider_trigger_type(&self) -> DeciderTriggerType {
        self.decider_trigger_type
    }
}

impl Default for CommandRequest {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug)]
pub struct SignalCommandResult {
    pub command_id: String,
    pub channel_name: String,
    pub status: ChannelRequestStatus,
    pub value: Option<DynValue>,
}

impl SignalCommandResult {
    /// The received value, if any and if it is a `T`
    pub fn value<T: Any>(&self) -> Option<&T> {
        self.value.as_ref().and_then(|value| value.downcast_ref::<T>())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerCommandResult {
    pub command_id: String,
    pub status: TimerStatus,
}

#[derive(Debug)]
pub struct InterStateChannelCommandResult {
    pub command_id: String,
    pub channel_name: String,
    pub status: ChannelRequestStatus,
    pub value: Option<DynValue>,
}

impl InterStateChannelCommandResult {
    pub fn value<T: Any>(&self) -> Option<&T> {
        self.value.as_ref().and_then(|value| value.downcast_ref::<T>())
    }
}

#[derive(Debug)]
pub struct LongRunningActivityCommandResult {
    pub command_id: String,
    pub activity_type: String,
    pub status: ActivityStatus,
    pub output: Option<DynValue>,
    pub failure_reason: Option<String>,
}

impl LongRunningActivityCommandResult {
    pub fn output<T: Any>(&self) -> Option<&T> {
        self.output.as_ref().and_then(|output| output.downcast_ref::<T>())
    }
}

/// Results of the commands a state requested, with payloads already decoded
#[derive(Debug, Default)]
pub struct CommandResults {
    pub signal_results: Vec<SignalCommandResult>,
    pub timer_results: Vec<TimerCommandResult>,
    pub inter_state_channel_results: Vec<InterStateChannelCommandResult>,
    pub long_running_activity_results: Vec<LongRunningActivityCommandResult>,
}

impl CommandResults {
    pub fn is_empty(&self) -> bool {
        self.signal_results.is_empty()
            && self.timer_results.is_empty()
            && self.inter_state_channel_results.is_empty()
            && self.long_running_activity_results.is_empty()
    }

    pub fn signal_result(&self, command_id: &str) -> Option<&SignalCommandResult> {
        self.signal_results
            .iter()
            .find(|result| result.command_id == command_id)
    }

    pub fn timer_result(&self, command_id: &str) -> Option<&TimerCommandResult> {
        self.timer_results
            .iter()
            .find(|result| result.command_id == command_id)
    }

    pub fn inter_state_channel_result(
        &self,
        command_id: &str,
    ) -> Option<&InterStateChannelCommandResult> {
        self.inter_state_channel_results
            .iter()
            .find(|result| result.command_id == command_id)
    }

    pub fn long_running_activity_result(
        &self,
        command_id: &str,
    ) -> Option<&LongRunningActivityCommandResult> {
        self.long_running_activity_results
            .iter()
            .find(|result| result.command_id == command_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_request() {
        let request = CommandRequest::empty();
        assert!(request.commands().is_empty());
        assert_eq!(
            request.decider_trigger_type(),
            DeciderTriggerType::AllCommandCompleted
        );
    }

    #[test]
    fn test_helpers_set_trigger_type() {
        let request = CommandRequest::for_any_command_completed([
            BaseCommand::from(SignalCommand::new("s1", "cancel")),
            BaseCommand::from(TimerCommand::new("t1", 100)),
        ]);
        assert_eq!(request.commands().len(), 2);
        assert_eq!(
            request.decider_trigger_type(),
            DeciderTriggerType::AnyCommandCompleted
        );

        let request = CommandRequest::for_any_command_closed(vec![SignalCommand::for_channel("c")]);
        assert_eq!(
            request.decider_trigger_type(),
            DeciderTriggerType::AnyCommandClosed
        );
    }

    #[test]
    fn test_timer_by_duration_is_in_the_future() {
        let before = Utc::now().timestamp();
        let timer = TimerCommand::by_duration("t", Duration::from_secs(60));
        assert!(timer.firing_unix_timestamp_seconds >= before + 60);
    }

    #[test]
    fn test_signal_result_lookup() {
        let results = CommandResults {
            signal_results: vec![SignalCommandResult {
                command_id: "s1".to_string(),
                channel_name: "cancel".to_string(),
                status: ChannelRequestStatus::Received,
                value: Some(DynValue::new(true)),
            }],
            ..Default::default()
        };

        let result = results.signal_result("s1").unwrap();
        assert_eq!(result.value::<bool>(), Some(&true));
        assert!(results.signal_result("s2").is_none());
        assert!(!results.is_empty());
    }
}
