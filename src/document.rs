//! Decoded document model: pages of positioned glyphs.
//!
//! This is the boundary with the document reader. Everything downstream
//! works on these types only, so a PDF decoded by pdfium and a glyph dump
//! produced by some other tool go through the same extraction code.

use crate::error::PageError;
use serde::{Deserialize, Serialize};

/// One rendered character.
///
/// `top` is measured downward from the top edge of the page, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    #[serde(rename = "char")]
    pub ch: char,
    pub x0: f32,
    pub top: f32,
    pub size: f32,
}

impl Glyph {
    pub fn new(ch: char, x0: f32, top: f32, size: f32) -> Self {
        Self { ch, x0, top, size }
    }
}

/// A page's glyphs plus its geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    pub glyphs: Vec<Glyph>,
}

impl Page {
    pub fn new(width: f32, height: f32, glyphs: Vec<Glyph>) -> Self {
        Self {
            width,
            height,
            glyphs,
        }
    }
}

/// A decoded source document.
///
/// Pages that failed to decode stay in place as `Err` so that page roles
/// (title page, plan page, …) keep pointing at the right index.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name, used as the document identifier in logs and reports.
    pub name: String,
    pub pages: Vec<Result<Page, PageError>>,
}

impl Document {
    pub fn new(name: impl Into<String>, pages: Vec<Result<Page, PageError>>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page by 1-indexed number.
    pub fn page(&self, page_num: usize) -> Option<&Result<Page, PageError>> {
        page_num.checked_sub(1).and_then(|i| self.pages.get(i))
    }
}

/// On-disk shape of a glyph dump (`*.glyphs.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlyphDump {
    pub pages: Vec<Page>,
}

impl From<&Document> for GlyphDump {
    /// Keeps only the pages that decoded; unreadable pages become empty.
    fn from(doc: &Document) -> Self {
        Self {
            pages: doc
                .pages
                .iter()
                .map(|p| p.clone().unwrap_or_default())
                .collect(),
        }
    }
}
