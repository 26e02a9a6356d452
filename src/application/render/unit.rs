use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::histogram;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::application::layout::{DEFAULT_DELIMITER, spiral_layout, split_words};
use crate::application::repos::ArtifactStore;

use super::document::{PageGeometry, RenderedDocument, render_pdf};
use super::runtime::dispatch_blocking;
use super::types::{RenderError, RenderRequest, RenderService, RenderedArtifact};

pub const METRIC_RENDER_MS: &str = "spiralpress_render_ms";

/// Name of the artifact stored for `job_id`; one artifact per job.
pub fn artifact_name(job_id: Uuid) -> String {
    format!("{job_id}.pdf")
}

/// Split `content`, lay it out as a spiral and serialize the paginated document.
///
/// Pure and CPU-bound; callers on the async runtime should go through
/// [`dispatch_blocking`].
pub fn compose_document(
    title: &str,
    content: &str,
    delimiter: char,
    geometry: &PageGeometry,
) -> Result<RenderedDocument, RenderError> {
    let words = split_words(content, delimiter);
    if words.is_empty() {
        return Err(RenderError::EmptyContent);
    }
    let layout = spiral_layout(words);
    render_pdf(title, &layout, geometry)
}

/// Render unit producing spiral-layout PDFs into an [`ArtifactStore`].
#[derive(Clone)]
pub struct SpiralRenderUnit {
    storage: Arc<dyn ArtifactStore>,
    geometry: PageGeometry,
    delimiter: char,
}

impl SpiralRenderUnit {
    pub fn new(storage: Arc<dyn ArtifactStore>, geometry: PageGeometry) -> Self {
        Self {
            storage,
            geometry,
            delimiter: DEFAULT_DELIMITER,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
}

#[async_trait]
impl RenderService for SpiralRenderUnit {
    #[instrument(skip(self, request), fields(job_id = %request.job_id))]
    async fn render(&self, request: RenderRequest) -> Result<RenderedArtifact, RenderError> {
        let started_at = Instant::now();
        let RenderRequest { job_id, content } = request;
        let geometry = self.geometry;
        let delimiter = self.delimiter;

        let document = dispatch_blocking(move || {
            compose_document(&job_id.to_string(), &content, delimiter, &geometry)
        })
        .await?;

        let pages = document.pages;
        let stored = self
            .storage
            .put(&artifact_name(job_id), Bytes::from(document.bytes))
            .await
            .map_err(RenderError::storage)?;

        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_RENDER_MS).record(elapsed_ms);
        debug!(
            reference = %stored.reference,
            size_bytes = stored.size_bytes,
            pages,
            elapsed_ms,
            "Rendered artifact stored"
        );

        Ok(RenderedArtifact {
            reference: stored.reference,
            checksum: stored.checksum,
            size_bytes: stored.size_bytes,
            pages,
        })
    }
}
