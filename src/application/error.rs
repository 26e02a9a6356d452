use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    application::{
        jobs::JobError,
        repos::{ArtifactStoreError, RepoError},
    },
    config::LoadError,
    infra::error::InfraError,
};

/// Diagnostic chain attached to error responses for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const VALIDATION: &str = "validation_error";
    pub const NOT_FOUND: &str = "not_found";
    pub const NOT_READY: &str = "not_ready";
    pub const ARTIFACT_MISSING: &str = "artifact_missing";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const STORAGE: &str = "storage_error";
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub code: &'static str,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Error response with a stable public message and a private diagnostic report.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    code: &'static str,
    public_message: &'static str,
    hint: Option<String>,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        code: &'static str,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            code,
            public_message,
            hint: None,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        code: &'static str,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            code,
            public_message,
            hint: None,
            report,
        }
    }

    /// Client-visible hint, for errors the caller can act on.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorMessage {
                code: self.code,
                message: self.public_message,
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}

const JOB_ERROR_SOURCE: &str = "application::error::job_error_to_http_error";

impl From<JobError> for HttpError {
    fn from(error: JobError) -> Self {
        match error {
            JobError::Domain(err) => HttpError::new(
                JOB_ERROR_SOURCE,
                StatusCode::BAD_REQUEST,
                codes::VALIDATION,
                "Content was rejected",
                err.to_string(),
            )
            .with_hint(err.to_string()),
            JobError::NotFound => HttpError::new(
                JOB_ERROR_SOURCE,
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
                "Job not found",
                "no job with the requested id",
            ),
            JobError::NotReady { status } => HttpError::new(
                JOB_ERROR_SOURCE,
                StatusCode::CONFLICT,
                codes::NOT_READY,
                "Job has no artifact yet",
                format!("job status is `{status}`"),
            )
            .with_hint(format!("job status is `{status}`")),
            JobError::ArtifactMissing => HttpError::new(
                JOB_ERROR_SOURCE,
                StatusCode::NOT_FOUND,
                codes::ARTIFACT_MISSING,
                "Artifact is no longer available",
                "completed job references a missing artifact",
            ),
            JobError::Repo(err) => repo_error_to_http(err),
            JobError::Storage(err) => storage_error_to_http(err),
        }
    }
}

fn repo_error_to_http(err: RepoError) -> HttpError {
    match err {
        RepoError::NotFound => HttpError::new(
            JOB_ERROR_SOURCE,
            StatusCode::NOT_FOUND,
            codes::NOT_FOUND,
            "Job not found",
            "resource not found",
        ),
        RepoError::Timeout => HttpError::new(
            JOB_ERROR_SOURCE,
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Job store timed out",
            "database timeout",
        ),
        other => HttpError::from_error(
            JOB_ERROR_SOURCE,
            StatusCode::SERVICE_UNAVAILABLE,
            codes::REPO,
            "Job store unavailable",
            &other,
        ),
    }
}

fn storage_error_to_http(err: ArtifactStoreError) -> HttpError {
    HttpError::from_error(
        JOB_ERROR_SOURCE,
        StatusCode::INTERNAL_SERVER_ERROR,
        codes::STORAGE,
        "Artifact could not be read",
        &err,
    )
}

/// Top-level error for process startup and the offline commands.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("render failed: {0}")]
    Render(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
