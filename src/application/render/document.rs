//! Paginated fixed-width PDF serialization.
//!
//! Emits a PDF 1.4 file using the built-in Courier font, so no font program
//! is embedded. Each layout line becomes one text line; lines that do not fit
//! on a page continue on the next one. Layouts too wide for the page even at
//! the minimum font size get wider pages rather than clipped columns.

use std::fmt::Write as FmtWrite;

use super::types::RenderError;

/// Courier advance width as a fraction of the font size.
const COURIER_ADVANCE: f32 = 0.6;
const LINE_SPACING: f32 = 1.2;
pub const MIN_FONT_SIZE: f32 = 4.0;
/// Largest page edge, in points, that conforming readers must support.
pub const MAX_PAGE_EDGE: f32 = 14_400.0;
const PRODUCER: &str = "spiralpress";

/// Page size, margins and preferred font size in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub font_size: f32,
}

impl PageGeometry {
    /// A4 portrait.
    pub const A4: PageGeometry = PageGeometry {
        width: 595.0,
        height: 842.0,
        margin: 36.0,
        font_size: 10.0,
    };

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    fn body_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    fn body_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }

    /// Reject geometries that leave no printable area.
    pub fn validate(&self) -> Result<(), RenderError> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(RenderError::document("font size must be positive"));
        }
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err(RenderError::document("margin must not be negative"));
        }
        if self.body_width() <= 0.0 || self.body_height() <= 0.0 {
            return Err(RenderError::document("margins leave no room for text"));
        }
        Ok(())
    }

    /// Font size that fits `columns` characters between the margins.
    fn fitted_font_size(&self, columns: usize) -> f32 {
        if columns == 0 {
            return self.font_size;
        }
        let fitting = self.body_width() / (columns as f32 * COURIER_ADVANCE);
        self.font_size.min(fitting).max(MIN_FONT_SIZE)
    }

    /// Page width that holds `columns` characters at `font_size` between the
    /// margins. Never narrower than the configured page.
    fn fitted_page_width(&self, columns: usize, font_size: f32) -> f32 {
        let text_width = columns as f32 * COURIER_ADVANCE * font_size;
        self.width.max(text_width + 2.0 * self.margin)
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// Serialized document plus the page count it was split into.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub font_size: f32,
    /// MediaBox width; wider than the configured page when the layout needs it.
    pub page_width: f32,
}

/// Serialize `text` into a paginated PDF titled `title`.
pub fn render_pdf(
    title: &str,
    text: &str,
    geometry: &PageGeometry,
) -> Result<RenderedDocument, RenderError> {
    geometry.validate()?;

    let lines: Vec<&str> = text.lines().collect();
    let columns = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    let font_size = geometry.fitted_font_size(columns);
    let page_width = geometry.fitted_page_width(columns, font_size);
    if page_width > MAX_PAGE_EDGE {
        return Err(RenderError::document(format!(
            "layout is {columns} columns wide and does not fit the widest supported page"
        )));
    }
    let leading = font_size * LINE_SPACING;
    let lines_per_page = ((geometry.body_height() / leading).floor() as usize).max(1);

    let pages: Vec<&[&str]> = if lines.is_empty() {
        vec![&[]]
    } else {
        lines.chunks(lines_per_page).collect()
    };

    let mut writer = PdfWriter::new();
    let page_count = pages.len();
    // Objects 1-4 are fixed; each page then takes a page object and a content stream.
    let page_ids: Vec<usize> = (0..page_count).map(|index| 5 + index * 2).collect();

    writer.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    writer.object(
        2,
        &format!("<< /Type /Pages /Kids [{kids}] /Count {page_count} >>"),
    );
    writer.object(
        3,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Courier /Encoding /WinAnsiEncoding >>",
    );
    writer.object(
        4,
        &format!(
            "<< /Title ({}) /Producer ({}) >>",
            escape_text(title),
            PRODUCER
        ),
    );

    for (page_lines, page_id) in pages.iter().zip(&page_ids) {
        let content_id = page_id + 1;
        writer.object(
            *page_id,
            &format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>",
                page_width, geometry.height
            ),
        );
        let stream = page_stream(page_lines, geometry, font_size, leading);
        writer.stream(content_id, &stream);
    }

    Ok(RenderedDocument {
        bytes: writer.finish(4),
        pages: page_count,
        font_size,
        page_width,
    })
}

fn page_stream(lines: &[&str], geometry: &PageGeometry, font_size: f32, leading: f32) -> String {
    let top = geometry.height - geometry.margin - font_size;
    let mut stream = String::new();
    let _ = writeln!(stream, "BT");
    let _ = writeln!(stream, "/F1 {font_size:.2} Tf");
    let _ = writeln!(stream, "{leading:.2} TL");
    let _ = writeln!(stream, "{:.2} {top:.2} Td", geometry.margin);
    for line in lines {
        let _ = writeln!(stream, "({}) Tj T*", escape_text(line));
    }
    let _ = writeln!(stream, "ET");
    stream
}

/// Escape a string for a PDF literal, mapping it onto WinAnsi.
///
/// Characters outside Latin-1 have no glyph in the base encoding and become `?`.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(escaped, "\\{:03o}", c as u32);
            }
            _ => escaped.push('?'),
        }
    }
    escaped
}

/// Accumulates numbered objects and remembers their byte offsets for the xref table.
struct PdfWriter {
    buffer: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buffer = Vec::with_capacity(4096);
        buffer.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buffer,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, id: usize, body: &str) {
        self.offsets.push((id, self.buffer.len()));
        self.buffer
            .extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    fn stream(&mut self, id: usize, content: &str) {
        self.offsets.push((id, self.buffer.len()));
        self.buffer.extend_from_slice(
            format!(
                "{id} 0 obj\n<< /Length {} >>\nstream\n{content}endstream\nendobj\n",
                content.len()
            )
            .as_bytes(),
        );
    }

    fn finish(mut self, info_id: usize) -> Vec<u8> {
        self.offsets.sort_unstable_by_key(|(id, _)| *id);
        let size = self.offsets.len() + 1;
        let xref_offset = self.buffer.len();

        let mut trailer = String::new();
        let _ = writeln!(trailer, "xref");
        let _ = writeln!(trailer, "0 {size}");
        let _ = writeln!(trailer, "0000000000 65535 f ");
        for (_, offset) in &self.offsets {
            let _ = writeln!(trailer, "{offset:010} 00000 n ");
        }
        let _ = writeln!(trailer, "trailer");
        let _ = writeln!(
            trailer,
            "<< /Size {size} /Root 1 0 R /Info {info_id} 0 R >>"
        );
        let _ = writeln!(trailer, "startxref");
        let _ = writeln!(trailer, "{xref_offset}");
        trailer.push_str("%%EOF\n");

        self.buffer.extend_from_slice(trailer.as_bytes());
        self.buffer
    }
}
