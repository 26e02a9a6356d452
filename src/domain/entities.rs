use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::types::{JobStatus, StatusUpdate};

/// Persisted unit of work describing one render request and its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub status: JobStatus,
    pub content: String,
    pub artifact_ref: Option<String>,
    pub error_detail: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl JobRecord {
    /// Build a fresh `pending` record for the given content.
    pub fn pending(id: Uuid, content: String, now: OffsetDateTime) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            content,
            artifact_ref: None,
            error_detail: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a validated status update in place.
    ///
    /// Callers are expected to have checked the transition; this only writes
    /// the fields the target state owns.
    pub fn apply(&mut self, update: &StatusUpdate, now: OffsetDateTime) {
        self.status = update.target();
        self.artifact_ref = update.artifact_ref().map(str::to_string);
        self.error_detail = update.error_detail().map(str::to_string);
        self.updated_at = now;
    }

    /// Crash-recovery reset of an orphaned `processing` record.
    pub fn reset_to_pending(&mut self, now: OffsetDateTime) {
        self.status = JobStatus::Pending;
        self.artifact_ref = None;
        self.error_detail = None;
        self.updated_at = now;
    }

    pub fn view(&self) -> JobStatusView {
        JobStatusView::from(self)
    }
}

/// Read-only projection handed back to submitters polling for progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatusView {
    pub id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&JobRecord> for JobStatusView {
    fn from(record: &JobRecord) -> Self {
        let artifact_ref = match record.status {
            JobStatus::Completed => record.artifact_ref.clone(),
            _ => None,
        };
        let error_detail = match record.status {
            JobStatus::Failed => record.error_detail.clone(),
            _ => None,
        };

        Self {
            id: record.id,
            status: record.status,
            artifact_ref,
            error_detail,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
