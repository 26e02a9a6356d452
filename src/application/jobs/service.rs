use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    application::{
        layout::{DEFAULT_DELIMITER, split_words},
        repos::{ArtifactStore, ArtifactStoreError, JobStore, NewJob, RepoError},
    },
    domain::{entities::JobStatusView, error::DomainError, types::JobStatus},
};

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("job not found")]
    NotFound,
    #[error("job is not ready for download (status `{status}`)")]
    NotReady { status: JobStatus },
    #[error("artifact for completed job is no longer available")]
    ArtifactMissing,
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Storage(#[from] ArtifactStoreError),
}

/// Submission, status and download operations exposed to clients.
#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn JobStore>,
    artifacts: Arc<dyn ArtifactStore>,
    delimiter: char,
}

impl JobService {
    pub fn new(store: Arc<dyn JobStore>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            artifacts,
            delimiter: DEFAULT_DELIMITER,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Validate `content` and enqueue it as a new `pending` job.
    ///
    /// Content must contain at least one non-blank word; anything else would
    /// only ever reach the `failed` state.
    #[instrument(skip(self, content), fields(content_len = content.len()))]
    pub async fn submit_job(&self, content: &str) -> Result<Uuid, JobError> {
        if content.trim().is_empty() {
            return Err(DomainError::EmptyContent.into());
        }
        let words = split_words(content, self.delimiter).len();
        if words == 0 {
            return Err(DomainError::NoWords {
                delimiter: self.delimiter,
            }
            .into());
        }

        let record = self.store.insert(NewJob::new(content)).await?;
        info!(job_id = %record.id, words, "Job submitted");
        Ok(record.id)
    }

    pub async fn get_job_status(&self, id: Uuid) -> Result<JobStatusView, JobError> {
        self.store
            .find_job(id)
            .await?
            .map(|record| record.view())
            .ok_or(JobError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn download_artifact(&self, id: Uuid) -> Result<Bytes, JobError> {
        let record = self.store.find_job(id).await?.ok_or(JobError::NotFound)?;
        if record.status != JobStatus::Completed {
            return Err(JobError::NotReady {
                status: record.status,
            });
        }
        let reference = record.artifact_ref.ok_or(JobError::ArtifactMissing)?;

        self.artifacts
            .get(&reference)
            .await?
            .ok_or(JobError::ArtifactMissing)
    }
}
