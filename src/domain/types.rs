//! Job lifecycle enumerations aligned with the persisted `render_jobs.status` column.

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Lifecycle state of a render job.
///
/// Forward edges are `pending → processing → {completed | failed}`. The only
/// backward edge, `processing → pending`, belongs to startup recovery and is
/// not reachable through [`JobStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether the scheduler may move a record from `self` to `next`.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobStatus {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Status change requested by the scheduler.
///
/// Each variant carries exactly the payload its target state is allowed to
/// hold, so a record can never gain an artifact outside `completed` or an
/// error outside `failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Processing,
    Completed { artifact_ref: String },
    Failed { error_detail: String },
}

impl StatusUpdate {
    pub fn target(&self) -> JobStatus {
        match self {
            StatusUpdate::Processing => JobStatus::Processing,
            StatusUpdate::Completed { .. } => JobStatus::Completed,
            StatusUpdate::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn artifact_ref(&self) -> Option<&str> {
        match self {
            StatusUpdate::Completed { artifact_ref } => Some(artifact_ref.as_str()),
            _ => None,
        }
    }

    pub fn error_detail(&self) -> Option<&str> {
        match self {
            StatusUpdate::Failed { error_detail } => Some(error_detail.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    #[test]
    fn only_forward_edges_are_allowed() {
        let allowed: Vec<(JobStatus, JobStatus)> = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();

        assert_eq!(
            allowed,
            vec![
                (JobStatus::Pending, JobStatus::Processing),
                (JobStatus::Processing, JobStatus::Completed),
                (JobStatus::Processing, JobStatus::Failed),
            ]
        );
    }

    #[test]
    fn terminal_states_never_leave() {
        for to in ALL {
            assert!(!JobStatus::Completed.can_transition_to(to));
            assert!(!JobStatus::Failed.can_transition_to(to));
        }
    }

    #[test]
    fn status_round_trips_through_its_column_value() {
        for status in ALL {
            assert_eq!(JobStatus::try_from(status.as_str()), Ok(status));
        }
        assert_eq!(
            JobStatus::try_from("Running"),
            Err(DomainError::UnknownStatus("Running".to_string()))
        );
    }

    #[test]
    fn update_payload_matches_target_state() {
        let done = StatusUpdate::Completed {
            artifact_ref: "a.pdf".to_string(),
        };
        assert_eq!(done.target(), JobStatus::Completed);
        assert_eq!(done.artifact_ref(), Some("a.pdf"));
        assert_eq!(done.error_detail(), None);

        let failed = StatusUpdate::Failed {
            error_detail: "disk full".to_string(),
        };
        assert_eq!(failed.artifact_ref(), None);
        assert_eq!(failed.error_detail(), Some("disk full"));
    }
}
