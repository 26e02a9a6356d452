//! Spiral text layout.
//!
//! Pure functions only: words in, a rectangular block of text out. The render
//! unit calls into this module from a blocking worker.

mod block;
mod spiral;

pub use block::{TextBlock, display_width};
pub use spiral::{COLUMN_SEPARATOR, ORNAMENT, START_MARKER, spiral_layout};

/// Delimiter used to split submitted content into words.
pub const DEFAULT_DELIMITER: char = ',';

/// Split raw content on `delimiter`, trimming each piece and discarding blanks.
pub fn split_words(content: &str, delimiter: char) -> Vec<&str> {
    content
        .split(delimiter)
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .collect()
}

/// Split `content` and lay the resulting words out as a spiral.
pub fn layout_content(content: &str, delimiter: char) -> String {
    spiral_layout(split_words(content, delimiter))
}
