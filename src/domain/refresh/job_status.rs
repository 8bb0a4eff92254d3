//! JobStatus enum for the lifecycle of a refresh job.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle status of a refresh job.
///
/// Monotonic: pending -> running -> exactly one of success, failed, skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Skipped => "skipped",
        }
    }
}

impl StateMachine for JobStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use JobStatus::*;
        matches!(
            (self, target),
            (Pending, Running) | (Running, Success) | (Running, Failed) | (Running, Skipped)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use JobStatus::*;
        match self {
            Pending => vec![Running],
            Running => vec![Success, Failed, Skipped],
            Success | Failed | Skipped => vec![],
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "success" => Ok(JobStatus::Success),
            "failed" => Ok(JobStatus::Failed),
            "skipped" => Ok(JobStatus::Skipped),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown job status '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_pending() {
        assert_eq!(JobStatus::default(), JobStatus::Pending);
    }

    #[test]
    fn pending_only_moves_to_running() {
        assert!(JobStatus::Pending.can_transition_to(&JobStatus::Running));
        assert!(!JobStatus::Pending.can_transition_to(&JobStatus::Success));
        assert!(!JobStatus::Pending.can_transition_to(&JobStatus::Skipped));
    }

    #[test]
    fn running_moves_to_any_terminal_state() {
        for target in [JobStatus::Success, JobStatus::Failed, JobStatus::Skipped] {
            assert!(JobStatus::Running.can_transition_to(&target));
        }
        assert!(!JobStatus::Running.can_transition_to(&JobStatus::Pending));
    }

    #[test]
    fn terminal_states_are_never_reopened() {
        for status in [JobStatus::Success, JobStatus::Failed, JobStatus::Skipped] {
            assert!(status.is_terminal());
            assert!(status.transition_to(JobStatus::Running).is_err());
        }
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn parses_storage_strings() {
        assert_eq!("skipped".parse::<JobStatus>().unwrap(), JobStatus::Skipped);
        assert!("done".parse::<JobStatus>().is_err());
    }
}
