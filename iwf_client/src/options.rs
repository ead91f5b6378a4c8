//! Client options.

use std::sync::Arc;
use std::time::Duration;

use iwf_core::{JsonObjectEncoder, ObjectEncoder};
use iwf_proto::workflow_service::{self as wire, IdReusePolicy, ResetType};
use tracing::warn;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8801";
pub const DEFAULT_WORKER_URL: &str = "http://localhost:8802";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_LONG_POLL_TIMEOUT: Duration = Duration::from_secs(60);

pub const SERVER_URL_ENV: &str = "IWF_SERVER_URL";
pub const WORKER_URL_ENV: &str = "IWF_WORKER_URL";
pub const REQUEST_TIMEOUT_ENV: &str = "IWF_REQUEST_TIMEOUT_SECS";

/// Client configuration options
#[derive(Clone)]
pub struct ClientOptions {
    /// Base URL of the iWF server
    pub server_url: String,
    /// URL the server calls back for state APIs
    pub worker_url: String,
    /// Timeout of ordinary requests
    pub request_timeout: Duration,
    /// Timeout of `getWithWait` long polls
    pub long_poll_timeout: Duration,
    /// Codec for inputs, signal values, attributes and outputs
    pub object_encoder: Arc<dyn ObjectEncoder>,
}

impl ClientOptions {
    /// Server and worker on their default local ports
    pub fn local_default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            worker_url: DEFAULT_WORKER_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            long_poll_timeout: DEFAULT_LONG_POLL_TIMEOUT,
            object_encoder: Arc::new(JsonObjectEncoder::new()),
        }
    }

    /// Local defaults overridden by `IWF_SERVER_URL`, `IWF_WORKER_URL` and
    /// `IWF_REQUEST_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let mut options = Self::local_default();
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            options.server_url = url;
        }
        if let Ok(url) = std::env::var(WORKER_URL_ENV) {
            options.worker_url = url;
        }
        if let Ok(secs) = std::env::var(REQUEST_TIMEOUT_ENV) {
            match secs.parse::<u64>() {
                Ok(secs) => options.request_timeout = Duration::from_secs(secs),
                Err(_) => warn!(
                    value = %secs,
                    "Ignoring invalid {}", REQUEST_TIMEOUT_ENV
                ),
            }
        }
        options
    }

    pub fn with_object_encoder(mut self, encoder: Arc<dyn ObjectEncoder>) -> Self {
        self.object_encoder = encoder;
        self
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("server_url", &self.server_url)
            .field("worker_url", &self.worker_url)
            .field("request_timeout", &self.request_timeout)
            .field("long_poll_timeout", &self.long_poll_timeout)
            .field("object_encoder", &self.object_encoder.encoding())
            .finish()
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Per-workflow start options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowStartOptions {
    /// Zero leaves the timeout to the server
    pub workflow_timeout_seconds: i32,
    pub id_reuse_policy: Option<IdReusePolicy>,
    pub cron_schedule: Option<String>,
}

impl WorkflowStartOptions {
    pub fn with_timeout(workflow_timeout_seconds: i32) -> Self {
        Self {
            workflow_timeout_seconds,
            ..Self::default()
        }
    }

    /// Server-side start options, omitted when nothing is set
    pub(crate) fn to_wire(&self) -> Option<wire::WorkflowStartOptions> {
        if self.id_reuse_policy.is_none() && self.cron_schedule.is_none() {
            return None;
        }
        Some(wire::WorkflowStartOptions {
            id_reuse_policy: self.id_reuse_policy,
            cron_schedule: self.cron_schedule.clone(),
        })
    }
}

/// Reset a workflow run to an earlier point.
///
/// Which optional fields are needed depends on the reset type; the server
/// checks them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetWorkflowRequest {
    pub workflow_id: String,
    pub workflow_run_id: Option<String>,
    pub reset_type: ResetType,
    pub history_event_id: Option<i32>,
    pub reason: Option<String>,
    pub reset_bad_binary_checksum: Option<String>,
    pub decision_offset: Option<i32>,
    pub earliest_time: Option<String>,
    pub skip_signal_reapply: Option<bool>,
}

impl ResetWorkflowRequest {
    pub fn new(workflow_id: impl Into<String>, reset_type: ResetType) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            workflow_run_id: None,
            reset_type,
            history_event_id: None,
            reason: None,
            reset_bad_binary_checksum: None,
            decision_offset: None,
            earliest_time: None,
            skip_signal_reapply: None,
        }
    }

    pub fn run_id(mut self, run_id: impl Into<String>) -> Self {
        self.workflow_run_id = Some(run_id.into());
        self
    }

    pub fn history_event_id(mut self, event_id: i32) -> Self {
        self.history_event_id = Some(event_id);
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn reset_bad_binary_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.reset_bad_binary_checksum = Some(checksum.into());
        self
    }

    pub fn decision_offset(mut self, offset: i32) -> Self {
        self.decision_offset = Some(offset);
        self
    }

    pub fn earliest_time(mut self, earliest_time: impl Into<String>) -> Self {
        self.earliest_time = Some(earliest_time.into());
        self
    }

    pub fn skip_signal_reapply(mut self, skip: bool) -> Self {
        self.skip_signal_reapply = Some(skip);
        self
    }
}

impl From<ResetWorkflowRequest> for wire::WorkflowResetRequest {
    fn from(request: ResetWorkflowRequest) -> Self {
        Self {
            workflow_id: request.workflow_id,
            workflow_run_id: request.workflow_run_id,
            reset_type: request.reset_type,
            history_event_id: request.history_event_id,
            reason: request.reason,
            reset_bad_binary_checksum: request.reset_bad_binary_checksum,
            decision_offset: request.decision_offset,
            earliest_time: request.earliest_time,
            skip_signal_reapply: request.skip_signal_reapply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_default() {
        let options = ClientOptions::local_default();
        assert_eq!(options.server_url, "http://localhost:8801");
        assert_eq!(options.worker_url, "http://localhost:8802");
        assert_eq!(options.object_encoder.encoding(), "json");
    }

    #[test]
    fn test_debug_hides_encoder() {
        let debug = format!("{:?}", ClientOptions::local_default());
        assert!(debug.contains("object_encoder: \"json\""));
    }

    #[test]
    fn test_start_options_only_sent_when_set() {
        assert!(WorkflowStartOptions::with_timeout(30).to_wire().is_none());

        let options = WorkflowStartOptions {
            cron_schedule: Some("*/5 * * * *".to_string()),
            ..WorkflowStartOptions::default()
        };
        let wire = options.to_wire().unwrap();
        assert_eq!(wire.cron_schedule.as_deref(), Some("*/5 * * * *"));
        assert!(wire.id_reuse_policy.is_none());
    }
}
