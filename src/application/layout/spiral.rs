//! Outward spiral arrangement of words.
//!
//! The block starts as a single marker line and grows one side at a time,
//! cycling TOP → RIGHT → BOTTOM → LEFT until every word is placed:
//!
//! ```text
//!         eleven twelve
//!         -------------
//!              two three
//!   ten |      ---------| four
//!  nine | >>> | one
//! eight |--------------
//!        seven six five
//!                        ~~*~~
//!                         ~*~
//! ```
//!
//! Top and bottom rows take at least two words each (fewer only when the
//! input runs out) and keep taking words until they reach the current block
//! width. Side columns take one word per inner line: the right column appends
//! `| word` and the left column prepends `word |`, directly against whatever
//! the line already holds.

use std::collections::VecDeque;

use super::block::{TextBlock, display_width};

pub const START_MARKER: &str = ">>>";
pub const COLUMN_SEPARATOR: char = '|';
pub const ORNAMENT: [&str; 2] = ["~~*~~", " ~*~ "];

const RULE: char = '-';
const MIN_WORDS_PER_ROW: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    fn next(self) -> Self {
        match self {
            Side::Top => Side::Right,
            Side::Right => Side::Bottom,
            Side::Bottom => Side::Left,
            Side::Left => Side::Top,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RowGrowth {
    Rightward,
    Leftward,
}

/// Lay `words` out as an outward spiral and return the lines joined by `\n`.
///
/// Every line of the result has the same width. An empty input yields an
/// empty string.
pub fn spiral_layout<'a, I>(words: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut words: VecDeque<&str> = words.into_iter().collect();
    let Some(first) = words.pop_front() else {
        return String::new();
    };

    let mut block = TextBlock::new(vec![format!(
        "{START_MARKER} {COLUMN_SEPARATOR} {first}"
    )]);
    block.align_right();

    let mut side = Side::Top;
    while !words.is_empty() {
        match side {
            Side::Top => grow_top(&mut block, &mut words),
            Side::Right => grow_right(&mut block, &mut words),
            Side::Bottom => grow_bottom(&mut block, &mut words),
            Side::Left => grow_left(&mut block, &mut words),
        }
        side = side.next();
    }

    block.append(ORNAMENT.iter().map(|line| line.to_string()));
    block.align_right();
    block.into_text()
}

fn grow_top(block: &mut TextBlock, words: &mut VecDeque<&str>) {
    let target = block.first().map(display_width).unwrap_or(0);
    let gap = block.last().map(leading_segment_width).unwrap_or(0) + 1;
    block.align_right();

    let row = build_row(words, gap, target, RowGrowth::Rightward);
    let rule_width = display_width(&row) - gap;
    let rule = format!("{}{}", " ".repeat(gap), rule_line(rule_width));

    block.prepend([row, rule]);
    block.align_left();
}

fn grow_bottom(block: &mut TextBlock, words: &mut VecDeque<&str>) {
    let target = block.first().map(display_width).unwrap_or(0);
    let gap = block.first().map(trailing_segment_width).unwrap_or(0) + 1;
    block.align_left();

    let row = build_row(words, gap, target, RowGrowth::Leftward);
    let rule_width = display_width(&row) - gap;
    let rule = format!("{}{}", rule_line(rule_width), " ".repeat(gap));

    block.append([rule, row]);
    block.align_right();
}

fn grow_right(block: &mut TextBlock, words: &mut VecDeque<&str>) {
    for index in inner_lines(block) {
        let Some(word) = words.pop_front() else {
            break;
        };
        if let Some(line) = block.line_mut(index) {
            line.push(COLUMN_SEPARATOR);
            line.push(' ');
            line.push_str(word);
        }
    }
    block.align_left();
}

fn grow_left(block: &mut TextBlock, words: &mut VecDeque<&str>) {
    for index in inner_lines(block).rev() {
        let Some(word) = words.pop_front() else {
            break;
        };
        if let Some(line) = block.line_mut(index) {
            line.insert_str(0, &format!("{word} {COLUMN_SEPARATOR}"));
        }
    }
    block.align_right();
}

/// Lines strictly between the first and the last.
fn inner_lines(block: &TextBlock) -> std::ops::Range<usize> {
    1..block.len().saturating_sub(1)
}

/// Build a top or bottom row behind a `gap`-wide blank margin.
///
/// Words are taken while fewer than two have been placed or the row is still
/// narrower than `target`.
fn build_row(
    words: &mut VecDeque<&str>,
    gap: usize,
    target: usize,
    growth: RowGrowth,
) -> String {
    let mut row = " ".repeat(gap);
    let mut placed = 0;

    while placed < MIN_WORDS_PER_ROW || display_width(&row) < target {
        let Some(word) = words.pop_front() else {
            break;
        };
        match growth {
            RowGrowth::Rightward => {
                if placed > 0 {
                    row.push(' ');
                }
                row.push_str(word);
            }
            RowGrowth::Leftward => {
                if placed > 0 {
                    row.insert(0, ' ');
                }
                row.insert_str(0, word);
            }
        }
        placed += 1;
    }

    row
}

fn rule_line(width: usize) -> String {
    std::iter::repeat_n(RULE, width).collect()
}

/// Columns before the first separator, or the leading blanks when there is none.
///
/// Only the marker line carries a separator at the bottom edge. After the
/// first BOTTOM pass the last line is a bare word row, and its leading blanks
/// are its offset within the block, so the new TOP row keeps the same indent
/// instead of collapsing to a one-column gap.
fn leading_segment_width(line: &str) -> usize {
    match line.find(COLUMN_SEPARATOR) {
        Some(index) => display_width(&line[..index]),
        None => line.chars().take_while(|c| *c == ' ').count(),
    }
}

/// Columns after the last separator, or the trailing blanks when there is none.
///
/// Mirror of [`leading_segment_width`]. Side columns never touch the first
/// line, so once a TOP row exists this always measures its trailing blanks.
fn trailing_segment_width(line: &str) -> usize {
    match line.rfind(COLUMN_SEPARATOR) {
        Some(index) => display_width(&line[index + COLUMN_SEPARATOR.len_utf8()..]),
        None => line.chars().rev().take_while(|c| *c == ' ').count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lines(layout: &str) -> Vec<&str> {
        layout.split('\n').collect()
    }

    /// Side fragments sit flush against neighbouring text, so words are
    /// recovered by splitting on anything that is not alphanumeric.
    fn placed_words(layout: &str) -> Vec<&str> {
        layout
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|token| !token.is_empty())
            .collect()
    }

    #[test]
    fn empty_input_yields_empty_layout() {
        assert_eq!(spiral_layout(Vec::<&str>::new()), "");
    }

    #[test]
    fn single_word_is_marker_plus_ornament() {
        assert_eq!(
            lines(&spiral_layout(["alpha"])),
            vec![">>> | alpha", "      ~~*~~", "       ~*~ "]
        );
    }

    #[test]
    fn three_words_grow_a_top_row() {
        assert_eq!(
            lines(&spiral_layout(["alpha", "beta", "gamma"])),
            vec![
                "     beta gamma",
                "     ----------",
                ">>> | alpha    ",
                "          ~~*~~",
                "           ~*~ ",
            ]
        );
    }

    #[test]
    fn final_row_may_hold_a_single_word_when_input_runs_out() {
        assert_eq!(
            lines(&spiral_layout(["a", "b"])),
            vec!["     b ", "     - ", ">>> | a", "  ~~*~~", "   ~*~ "]
        );
    }

    #[test]
    fn full_cycle_walks_every_side_clockwise() {
        let words = [
            "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
            "eleven", "twelve",
        ];
        assert_eq!(
            lines(&spiral_layout(words)),
            vec![
                "        eleven twelve       ",
                "        -------------       ",
                "             two three      ",
                "  ten |      ---------| four",
                " nine | >>> | one           ",
                "eight |--------------       ",
                "       seven six five       ",
                "                       ~~*~~",
                "                        ~*~ ",
            ]
        );
    }

    #[test]
    fn side_columns_use_flush_separator_fragments() {
        let layout = spiral_layout(["one", "two", "three", "four", "five", "six", "seven", "eight"]);
        let lines = lines(&layout);
        assert!(lines[1].ends_with("-| four"), "{:?}", lines[1]);
        assert!(lines[3].starts_with("eight |-"), "{:?}", lines[3]);
    }

    #[test]
    fn segment_widths_fall_back_to_padding() {
        assert_eq!(leading_segment_width(">>> | alpha"), 4);
        assert_eq!(leading_segment_width("   seven six"), 3);
        assert_eq!(trailing_segment_width("a | bc "), 4);
        assert_eq!(trailing_segment_width("two three  "), 2);
    }

    #[test]
    fn rows_take_two_words_even_when_the_first_is_wide_enough() {
        let mut words: VecDeque<&str> = ["abcdefghijkl", "b", "c"].into_iter().collect();
        let row = build_row(&mut words, 1, 4, RowGrowth::Rightward);
        assert_eq!(row, " abcdefghijkl b");
        assert_eq!(words, ["c"]);
    }

    #[test]
    fn leftward_rows_read_in_reverse_order() {
        let mut words: VecDeque<&str> = ["x", "y", "z"].into_iter().collect();
        let row = build_row(&mut words, 2, 6, RowGrowth::Leftward);
        assert_eq!(row, "z y x  ");
        assert!(words.is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        #[test]
        fn layout_is_always_rectangular(words in prop::collection::vec("[a-z]{1,9}", 1..60)) {
            let layout = spiral_layout(words.iter().map(String::as_str));
            let widths: Vec<usize> = layout.split('\n').map(display_width).collect();
            prop_assert!(widths.iter().all(|width| *width == widths[0]));
        }

        #[test]
        fn every_word_is_placed_exactly_once(count in 1usize..80) {
            let words: Vec<String> = (0..count).map(|i| format!("w{i}")).collect();
            let layout = spiral_layout(words.iter().map(String::as_str));

            let mut placed: Vec<&str> = placed_words(&layout);
            placed.sort_unstable();
            let mut expected: Vec<&str> = words.iter().map(String::as_str).collect();
            expected.sort_unstable();
            prop_assert_eq!(placed, expected);
        }

        #[test]
        fn layout_always_ends_with_the_ornament(words in prop::collection::vec("[a-z]{1,9}", 1..40)) {
            let layout = spiral_layout(words.iter().map(String::as_str));
            let tail: Vec<&str> = layout.split('\n').rev().take(2).collect();
            prop_assert!(tail[0].ends_with(ORNAMENT[1]));
            prop_assert!(tail[1].ends_with(ORNAMENT[0]));
        }
    }
}
