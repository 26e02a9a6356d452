use std::convert::TryFrom;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{JobStore, NewJob, RepoError, check_transition},
    domain::{
        entities::JobRecord,
        types::{JobStatus, StatusUpdate},
    },
};

use super::{PostgresJobStore, map_sqlx_error};

const JOB_COLUMNS: &str =
    "id, status, content, artifact_ref, error_detail, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    status: String,
    content: String,
    artifact_ref: Option<String>,
    error_detail: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<JobRow> for JobRecord {
    type Error = RepoError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::try_from(row.status.as_str())
            .map_err(|err| RepoError::from_persistence(err.to_string()))?;

        Ok(Self {
            id: row.id,
            status,
            content: row.content,
            artifact_ref: row.artifact_ref,
            error_detail: row.error_detail,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn insert(&self, job: NewJob) -> Result<JobRecord, RepoError> {
        let sql = format!(
            "INSERT INTO render_jobs (id, status, content) VALUES ($1, $2, $3) RETURNING {JOB_COLUMNS}"
        );
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(job.id)
            .bind(JobStatus::Pending.as_str())
            .bind(&job.content)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        JobRecord::try_from(row)
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<JobRecord>, RepoError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM render_jobs WHERE id = $1");
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(JobRecord::try_from).transpose()
    }

    async fn find_oldest_pending(&self) -> Result<Option<JobRecord>, RepoError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM render_jobs \
             WHERE status = $1 \
             ORDER BY created_at ASC, seq ASC \
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(JobStatus::Pending.as_str())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(JobRecord::try_from).transpose()
    }

    async fn find_all_processing(&self) -> Result<Vec<JobRecord>, RepoError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM render_jobs WHERE status = $1 ORDER BY created_at ASC, seq ASC"
        );
        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(JobStatus::Processing.as_str())
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(JobRecord::try_from).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        update: StatusUpdate,
    ) -> Result<JobRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let select = format!("SELECT {JOB_COLUMNS} FROM render_jobs WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, JobRow>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;
        let current = JobRecord::try_from(current)?;

        if !check_transition(current.status, &update)? {
            tx.commit().await.map_err(map_sqlx_error)?;
            return Ok(current);
        }

        let write = format!(
            "UPDATE render_jobs \
                SET status = $2, artifact_ref = $3, error_detail = $4, updated_at = now() \
              WHERE id = $1 \
             RETURNING {JOB_COLUMNS}"
        );
        let row = sqlx::query_as::<_, JobRow>(&write)
            .bind(id)
            .bind(update.target().as_str())
            .bind(update.artifact_ref())
            .bind(update.error_detail())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;

        JobRecord::try_from(row)
    }

    async fn reset_all_processing_to_pending(&self) -> Result<u64, RepoError> {
        let result = sqlx::query(
            "UPDATE render_jobs \
                SET status = $1, artifact_ref = NULL, error_detail = NULL, updated_at = now() \
              WHERE status = $2",
        )
        .bind(JobStatus::Pending.as_str())
        .bind(JobStatus::Processing.as_str())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
