use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{JobStore, NewJob, RepoError, check_transition},
    domain::{
        entities::JobRecord,
        types::{JobStatus, StatusUpdate},
    },
};

struct StoredJob {
    seq: u64,
    record: JobRecord,
}

/// Process-local job store. Jobs do not survive a restart.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: DashMap<Uuid, StoredJob>,
    next_seq: AtomicU64,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: NewJob) -> Result<JobRecord, RepoError> {
        let record = JobRecord::pending(job.id, job.content, OffsetDateTime::now_utc());
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        match self.jobs.entry(job.id) {
            Entry::Occupied(_) => Err(RepoError::Duplicate {
                constraint: "render_jobs_pkey".to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(StoredJob {
                    seq,
                    record: record.clone(),
                });
                Ok(record)
            }
        }
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<JobRecord>, RepoError> {
        Ok(self.jobs.get(&id).map(|entry| entry.record.clone()))
    }

    async fn find_oldest_pending(&self) -> Result<Option<JobRecord>, RepoError> {
        Ok(self
            .jobs
            .iter()
            .filter(|entry| entry.record.status == JobStatus::Pending)
            .min_by_key(|entry| (entry.record.created_at, entry.seq))
            .map(|entry| entry.record.clone()))
    }

    async fn find_all_processing(&self) -> Result<Vec<JobRecord>, RepoError> {
        let mut entries: Vec<(u64, JobRecord)> = self
            .jobs
            .iter()
            .filter(|entry| entry.record.status == JobStatus::Processing)
            .map(|entry| (entry.seq, entry.record.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().map(|(_, record)| record).collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        update: StatusUpdate,
    ) -> Result<JobRecord, RepoError> {
        let mut entry = self.jobs.get_mut(&id).ok_or(RepoError::NotFound)?;
        if check_transition(entry.record.status, &update)? {
            entry.record.apply(&update, OffsetDateTime::now_utc());
        }
        Ok(entry.record.clone())
    }

    async fn reset_all_processing_to_pending(&self) -> Result<u64, RepoError> {
        let now = OffsetDateTime::now_utc();
        let mut reset = 0;
        for mut entry in self.jobs.iter_mut() {
            if entry.record.status == JobStatus::Processing {
                entry.record.reset_to_pending(now);
                reset += 1;
            }
        }
        Ok(reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oldest_pending_follows_insertion_order() {
        let store = MemoryJobStore::new();
        let first = store.insert(NewJob::new("one")).await.unwrap();
        let second = store.insert(NewJob::new("two")).await.unwrap();
        let third = store.insert(NewJob::new("three")).await.unwrap();

        assert_eq!(store.find_oldest_pending().await.unwrap().unwrap().id, first.id);

        store.update_status(first.id, StatusUpdate::Processing).await.unwrap();
        assert_eq!(store.find_oldest_pending().await.unwrap().unwrap().id, second.id);

        store.update_status(second.id, StatusUpdate::Processing).await.unwrap();
        assert_eq!(store.find_oldest_pending().await.unwrap().unwrap().id, third.id);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let store = MemoryJobStore::new();
        let job = NewJob::new("same");
        store.insert(job.clone()).await.unwrap();

        assert!(matches!(
            store.insert(job).await,
            Err(RepoError::Duplicate { .. })
        ));
    }

    #[tokio::test]
    async fn update_status_enforces_transitions() {
        let store = MemoryJobStore::new();
        let job = store.insert(NewJob::new("x")).await.unwrap();

        let err = store
            .update_status(
                job.id,
                StatusUpdate::Completed {
                    artifact_ref: "x.pdf".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::InvalidTransition {
                from: JobStatus::Pending,
                to: JobStatus::Completed
            }
        ));

        let processing = store.update_status(job.id, StatusUpdate::Processing).await.unwrap();
        assert_eq!(processing.status, JobStatus::Processing);
        assert!(processing.updated_at >= job.updated_at);

        let completed = store
            .update_status(
                job.id,
                StatusUpdate::Completed {
                    artifact_ref: "x.pdf".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(completed.artifact_ref.as_deref(), Some("x.pdf"));
        assert!(completed.error_detail.is_none());

        assert!(matches!(
            store.update_status(job.id, StatusUpdate::Processing).await,
            Err(RepoError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn same_state_update_is_a_no_op() {
        let store = MemoryJobStore::new();
        let job = store.insert(NewJob::new("x")).await.unwrap();
        let first = store.update_status(job.id, StatusUpdate::Processing).await.unwrap();
        let again = store.update_status(job.id, StatusUpdate::Processing).await.unwrap();

        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = MemoryJobStore::new();
        assert!(store.find_job(Uuid::new_v4()).await.unwrap().is_none());
        assert!(matches!(
            store
                .update_status(Uuid::new_v4(), StatusUpdate::Processing)
                .await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn reset_moves_only_processing_records() {
        let store = MemoryJobStore::new();
        let pending = store.insert(NewJob::new("p")).await.unwrap();
        let stuck = store.insert(NewJob::new("s")).await.unwrap();
        let done = store.insert(NewJob::new("d")).await.unwrap();
        store.update_status(stuck.id, StatusUpdate::Processing).await.unwrap();
        store.update_status(done.id, StatusUpdate::Processing).await.unwrap();
        store
            .update_status(
                done.id,
                StatusUpdate::Failed {
                    error_detail: "bad".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(store.find_all_processing().await.unwrap().len(), 1);
        assert_eq!(store.reset_all_processing_to_pending().await.unwrap(), 1);
        assert!(store.find_all_processing().await.unwrap().is_empty());

        let statuses = [
            store.find_job(pending.id).await.unwrap().unwrap().status,
            store.find_job(stuck.id).await.unwrap().unwrap().status,
            store.find_job(done.id).await.unwrap().unwrap().status,
        ];
        assert_eq!(
            statuses,
            [JobStatus::Pending, JobStatus::Pending, JobStatus::Failed]
        );
        assert_eq!(store.find_oldest_pending().await.unwrap().unwrap().id, pending.id);
    }
}
