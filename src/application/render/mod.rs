//! Render unit: spiral layout plus paginated document serialization.
//!
//! Layout and serialization are CPU-bound and run on the blocking pool; the
//! async side only hands over the request, awaits the result message and
//! writes the finished bytes to artifact storage. State changes (recording
//! the job outcome) happen in the caller, the scheduler.

mod document;
mod runtime;
mod types;
mod unit;

pub use document::{MIN_FONT_SIZE, PageGeometry, RenderedDocument, render_pdf};
pub use runtime::dispatch_blocking;
pub use types::{RenderError, RenderRequest, RenderService, RenderedArtifact};
pub use unit::{METRIC_RENDER_MS, SpiralRenderUnit, artifact_name, compose_document};
