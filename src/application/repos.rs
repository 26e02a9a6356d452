//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::JobRecord;
use crate::domain::types::{JobStatus, StatusUpdate};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid status transition from `{from}` to `{to}`")]
    InvalidTransition { from: JobStatus, to: JobStatus },
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Input for [`JobStore::insert`].
#[derive(Debug, Clone)]
pub struct NewJob {
    pub id: Uuid,
    pub content: String,
}

impl NewJob {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
        }
    }
}

/// Durable record of submitted jobs.
///
/// Finding the oldest pending job and marking it `processing` are separate
/// calls. Only a single scheduler is expected to drive a store; with more
/// than one, a job can be picked up twice.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: NewJob) -> Result<JobRecord, RepoError>;

    async fn find_job(&self, id: Uuid) -> Result<Option<JobRecord>, RepoError>;

    /// Oldest `pending` record by `created_at`, ties broken by insertion order.
    async fn find_oldest_pending(&self) -> Result<Option<JobRecord>, RepoError>;

    async fn find_all_processing(&self) -> Result<Vec<JobRecord>, RepoError>;

    /// Apply a status transition and return the stored record.
    ///
    /// An update targeting the record's current status is a no-op that
    /// returns the record unchanged. Any other edge not allowed by
    /// [`JobStatus::can_transition_to`] fails with
    /// [`RepoError::InvalidTransition`].
    async fn update_status(
        &self,
        id: Uuid,
        update: StatusUpdate,
    ) -> Result<JobRecord, RepoError>;

    /// Reset every `processing` record to `pending` in one batch, returning how many moved.
    async fn reset_all_processing_to_pending(&self) -> Result<u64, RepoError>;
}

/// Resolve what a store should do with `update` given the record's current status.
///
/// Returns `Ok(false)` for the idempotent same-state case and `Ok(true)` when
/// the update must be written.
pub fn check_transition(current: JobStatus, update: &StatusUpdate) -> Result<bool, RepoError> {
    let target = update.target();
    if current == target {
        return Ok(false);
    }
    if current.can_transition_to(target) {
        return Ok(true);
    }
    Err(RepoError::InvalidTransition {
        from: current,
        to: target,
    })
}

/// Metadata describing a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub reference: String,
    pub checksum: String,
    pub size_bytes: u64,
}

#[derive(Debug, Error)]
pub enum ArtifactStoreError {
    #[error("invalid artifact reference `{0}`")]
    InvalidReference(String),
    #[error("artifact payload is empty")]
    EmptyPayload,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Durable storage for rendered artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `data` under `name`. Either the whole payload becomes visible or nothing does.
    async fn put(&self, name: &str, data: Bytes) -> Result<StoredArtifact, ArtifactStoreError>;

    /// Read a stored artifact, returning `None` when it no longer exists.
    async fn get(&self, reference: &str) -> Result<Option<Bytes>, ArtifactStoreError>;
}
