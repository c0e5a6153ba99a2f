//! Line reconstruction: turn an unordered bag of glyphs into ordered rows.
//!
//! ## Algorithm
//!
//! ```text
//! glyphs ──▶ bucket by round(top / tolerance) ──▶ sort bucket by x0 ──▶ concat ──▶ trim
//!                     (BTreeMap: rows come out top to bottom)
//! ```
//!
//! Rounding absorbs sub-pixel rendering jitter. Two visually distinct rows
//! whose tops round to the same bucket (superscripts, footnote markers)
//! merge into one line; that limitation is accepted.
//!
//! Bucket keys use `f32::round`, which sends exact halves away from zero.
//! A top sitting on a bucket boundary (100.05 at a 0.1 tolerance) can land
//! in a different bucket than a half-to-even rounding of the same value
//! would give, so two glyphs straddling that boundary may split or merge
//! differently.
//!
//! The two-column variant splits a page's glyphs at the horizontal midpoint
//! and reconstructs each half independently. Its reading order is every left
//! line, then every right line; section detection relies on that order.

use crate::document::{Glyph, Page};
use serde::Serialize;
use std::collections::BTreeMap;

/// A reconstructed row of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    /// Trimmed text; never empty.
    pub text: String,
    /// Bucketed vertical position (top of page = 0).
    pub y: f32,
    /// Mean size of the glyphs that formed the row.
    pub avg_font_size: f32,
}

/// Group glyphs into lines ordered top to bottom.
///
/// Within a row, glyphs are ordered by `x0`; glyphs sharing an `x0` keep
/// their input order. Rows whose text is blank after trimming are dropped.
/// Glyphs with a non-finite position cannot be placed and are ignored.
pub fn reconstruct_lines<'a, I>(glyphs: I, tolerance: f32) -> Vec<Line>
where
    I: IntoIterator<Item = &'a Glyph>,
{
    let mut rows: BTreeMap<i64, Vec<&Glyph>> = BTreeMap::new();
    for glyph in glyphs {
        if !glyph.top.is_finite() || !glyph.x0.is_finite() {
            continue;
        }
        let key = (glyph.top / tolerance).round() as i64;
        rows.entry(key).or_default().push(glyph);
    }

    rows.into_iter()
        .filter_map(|(key, mut row)| {
            // Stable: equal x0 keeps original glyph order.
            row.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            let raw: String = row.iter().map(|g| g.ch).collect();
            let text = raw.trim();
            if text.is_empty() {
                return None;
            }
            let avg_font_size = row.iter().map(|g| g.size).sum::<f32>() / row.len() as f32;
            Some(Line {
                text: text.to_string(),
                y: key as f32 * tolerance,
                avg_font_size,
            })
        })
        .collect()
}

/// Lines of a two-column page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnLines {
    pub left: Vec<Line>,
    pub right: Vec<Line>,
}

impl ColumnLines {
    /// Left column top to bottom, then right column top to bottom.
    pub fn reading_order(&self) -> impl Iterator<Item = &Line> {
        self.left.iter().chain(self.right.iter())
    }

    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// All lines in reading order joined by newlines.
    pub fn text(&self) -> String {
        self.reading_order()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Partition glyphs at the page's horizontal midpoint.
///
/// A glyph starting strictly left of the midpoint goes left; everything
/// else, including a glyph exactly on it, goes right.
pub fn split_columns(page: &Page) -> (Vec<&Glyph>, Vec<&Glyph>) {
    let mid_x = page.width / 2.0;
    page.glyphs.iter().partition(|g| g.x0 < mid_x)
}

/// Reconstruct each half of a two-column page independently.
pub fn reconstruct_columns(page: &Page, tolerance: f32) -> ColumnLines {
    let (left, right) = split_columns(page);
    ColumnLines {
        left: reconstruct_lines(left, tolerance),
        right: reconstruct_lines(right, tolerance),
    }
}
