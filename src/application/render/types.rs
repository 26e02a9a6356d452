use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Rendering request handed to the render unit by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Job the artifact belongs to; also names the stored artifact.
    pub job_id: Uuid,
    /// Raw submitted text, split into words by the render unit.
    pub content: String,
}

impl RenderRequest {
    pub fn new(job_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            job_id,
            content: content.into(),
        }
    }
}

/// Result of a successful render: the artifact is durably stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedArtifact {
    /// Store-relative reference recorded on the job.
    pub reference: String,
    /// Hex-encoded SHA-256 of the stored bytes.
    pub checksum: String,
    pub size_bytes: u64,
    pub pages: usize,
}

/// Structured errors surfaced by the render unit. The display string becomes
/// the job's `error_detail`, so messages stay human readable.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("content contains no words to lay out")]
    EmptyContent,
    #[error("document serialization failed: {message}")]
    Document { message: String },
    #[error("artifact storage failed: {message}")]
    Storage { message: String },
    #[error("render worker aborted: {0}")]
    Aborted(String),
}

impl RenderError {
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document {
            message: message.into(),
        }
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage {
            message: err.to_string(),
        }
    }
}

/// Seam between the scheduler and whatever turns content into a stored artifact.
#[async_trait]
pub trait RenderService: Send + Sync {
    async fn render(&self, request: RenderRequest) -> Result<RenderedArtifact, RenderError>;
}
