//! Job status documents returned while a compilation is in flight.
//!
//! The download URL serves a small status document until the result payload
//! lands in object storage. The poll loop recognizes these documents as the
//! "not ready yet" sentinel; anything else at a 2xx status is handed to the
//! payload codec.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Status vocabulary of the remote job API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiJobStatus {
    Creating,
    Created,
    Validating,
    Validated,
    Running,
    Completed,
    Cancelled,
    ErrorCreatingJob,
    ErrorValidatingJob,
    ErrorRunningJob,
}

impl ApiJobStatus {
    /// The wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creating => "CREATING",
            Self::Created => "CREATED",
            Self::Validating => "VALIDATING",
            Self::Validated => "VALIDATED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::ErrorCreatingJob => "ERROR_CREATING_JOB",
            Self::ErrorValidatingJob => "ERROR_VALIDATING_JOB",
            Self::ErrorRunningJob => "ERROR_RUNNING_JOB",
        }
    }

    /// Whether the job is still making progress (not yet in a terminal state).
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::Creating | Self::Created | Self::Validating | Self::Validated | Self::Running
        )
    }

    /// Whether the job ended in an error state.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ErrorCreatingJob | Self::ErrorValidatingJob | Self::ErrorRunningJob
        )
    }

    /// Whether the job reached any terminal state.
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}

impl std::fmt::Display for ApiJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue information nested in a status document.
///
/// All fields are optional; the remote sends camelCase names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfoQueue {
    /// Position in the execution queue.
    #[serde(default)]
    pub position: Option<i64>,
    /// Internal queue status string.
    #[serde(default, rename = "status")]
    pub queue_status: Option<String>,
    /// Estimated start time.
    #[serde(default, rename = "estimatedStartTime")]
    pub estimated_start_time: Option<DateTime<Utc>>,
    /// Estimated completion time.
    #[serde(default, rename = "estimatedCompleteTime")]
    pub estimated_complete_time: Option<DateTime<Utc>>,
    /// Hub-level scheduling priority.
    #[serde(default, rename = "hubPriority")]
    pub hub_priority: Option<f64>,
    /// Group-level scheduling priority.
    #[serde(default, rename = "groupPriority")]
    pub group_priority: Option<f64>,
    /// Project-level scheduling priority.
    #[serde(default, rename = "projectPriority")]
    pub project_priority: Option<f64>,
}

/// A job status document.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// Current job status.
    pub status: ApiJobStatus,
    /// Queue information, present while the job is queued.
    #[serde(default, rename = "infoQueue")]
    pub info_queue: Option<InfoQueue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names_round_trip() {
        for (wire, status) in [
            ("CREATING", ApiJobStatus::Creating),
            ("RUNNING", ApiJobStatus::Running),
            ("COMPLETED", ApiJobStatus::Completed),
            ("ERROR_RUNNING_JOB", ApiJobStatus::ErrorRunningJob),
        ] {
            let parsed: ApiJobStatus =
                serde_json::from_value(serde_json::json!(wire)).unwrap();
            assert_eq!(parsed, status);
            assert_eq!(parsed.as_str(), wire);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        let result: Result<ApiJobStatus, _> =
            serde_json::from_value(serde_json::json!("EXPLODED"));
        assert!(result.is_err());
    }

    #[test]
    fn test_pending_error_terminal_partition() {
        assert!(ApiJobStatus::Validating.is_pending());
        assert!(!ApiJobStatus::Validating.is_terminal());

        assert!(ApiJobStatus::ErrorValidatingJob.is_error());
        assert!(ApiJobStatus::ErrorValidatingJob.is_terminal());
        assert!(!ApiJobStatus::ErrorValidatingJob.is_pending());

        assert!(ApiJobStatus::Completed.is_terminal());
        assert!(!ApiJobStatus::Completed.is_error());

        assert!(ApiJobStatus::Cancelled.is_terminal());
        assert!(!ApiJobStatus::Cancelled.is_error());
    }

    #[test]
    fn test_status_response_with_camel_case_queue_info() {
        let doc = serde_json::json!({
            "status": "RUNNING",
            "infoQueue": {
                "position": 3,
                "status": "PENDING_IN_QUEUE",
                "estimatedStartTime": "2026-03-01T12:00:00Z",
                "hubPriority": 0.5,
                "groupPriority": 0.25,
                "projectPriority": 0.125
            }
        });
        let parsed: StatusResponse = serde_json::from_value(doc).unwrap();
        assert_eq!(parsed.status, ApiJobStatus::Running);

        let queue = parsed.info_queue.unwrap();
        assert_eq!(queue.position, Some(3));
        assert_eq!(queue.queue_status.as_deref(), Some("PENDING_IN_QUEUE"));
        assert!(queue.estimated_start_time.is_some());
        assert_eq!(queue.hub_priority, Some(0.5));
    }

    #[test]
    fn test_status_response_without_queue_info() {
        let parsed: StatusResponse =
            serde_json::from_value(serde_json::json!({"status": "CREATED"})).unwrap();
        assert_eq!(parsed.status, ApiJobStatus::Created);
        assert!(parsed.info_queue.is_none());
    }
}
