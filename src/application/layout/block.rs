/// Width of a line in columns, counting Unicode scalar values.
pub fn display_width(line: &str) -> usize {
    line.chars().count()
}

/// Ordered lines of text that the spiral grows around.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    lines: Vec<String>,
}

impl TextBlock {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Width of the widest line.
    pub fn width(&self) -> usize {
        self.lines
            .iter()
            .map(|line| display_width(line))
            .max()
            .unwrap_or(0)
    }

    pub fn first(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub(crate) fn line_mut(&mut self, index: usize) -> Option<&mut String> {
        self.lines.get_mut(index)
    }

    /// Insert `lines` above the current first line, keeping their order.
    pub fn prepend<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut head: Vec<String> = lines.into_iter().collect();
        head.append(&mut self.lines);
        self.lines = head;
    }

    pub fn append<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.lines.extend(lines);
    }

    /// Pad every line with trailing blanks up to the block width.
    pub fn align_left(&mut self) {
        let width = self.width();
        for line in &mut self.lines {
            let missing = width - display_width(line);
            line.extend(std::iter::repeat_n(' ', missing));
        }
    }

    /// Pad every line with leading blanks up to the block width.
    pub fn align_right(&mut self) {
        let width = self.width();
        for line in &mut self.lines {
            let missing = width - display_width(line);
            if missing > 0 {
                line.insert_str(0, &" ".repeat(missing));
            }
        }
    }

    pub fn is_rectangular(&self) -> bool {
        let width = self.width();
        self.lines.iter().all(|line| display_width(line) == width)
    }

    /// Join the lines with `\n`.
    pub fn into_text(self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(lines: &[&str]) -> TextBlock {
        TextBlock::new(lines.iter().map(|line| line.to_string()).collect())
    }

    #[test]
    fn align_left_pads_with_trailing_blanks() {
        let mut b = block(&["ab", "abcd", ""]);
        b.align_left();
        assert_eq!(b.lines(), &["ab  ", "abcd", "    "]);
    }

    #[test]
    fn align_right_pads_with_leading_blanks() {
        let mut b = block(&["ab", "abcd"]);
        b.align_right();
        assert_eq!(b.lines(), &["  ab", "abcd"]);
    }

    #[test]
    fn alignment_is_idempotent() {
        let mut left = block(&["x", "yyy", "zz"]);
        left.align_left();
        let once = left.clone();
        left.align_left();
        assert_eq!(left, once);

        let mut right = block(&["x", "yyy", "zz"]);
        right.align_right();
        let once = right.clone();
        right.align_right();
        assert_eq!(right, once);
    }

    #[test]
    fn width_counts_characters_not_bytes() {
        let mut b = block(&["żółw", "abcde"]);
        assert_eq!(b.width(), 5);
        b.align_right();
        assert_eq!(b.lines()[0], " żółw");
        assert!(b.is_rectangular());
    }

    #[test]
    fn prepend_keeps_insertion_order() {
        let mut b = block(&["c"]);
        b.prepend(["a".to_string(), "b".to_string()]);
        b.append(["d".to_string()]);
        assert_eq!(b.lines(), &["a", "b", "c", "d"]);
    }
}
