//! Pipeline stages for glyph-layout extraction.
//!
//! Each submodule implements one transformation step and is testable on
//! synthetic glyphs, without pdfium.
//!
//! ## Data Flow
//!
//! ```text
//!                          ┌──▶ heading  (title page)
//! input ──▶ decode ──▶ lines ──▶ plan    (plan page)
//! (path)    (pdfium)  (rows) └──▶ sections (sections page, two columns)
//! ```
//!
//! 1. [`input`]: list a batch, validate each file and pick its
//!    [`input::GlyphSource`]
//! 2. [`decode`]: read a PDF's text layer into positioned glyphs; runs on
//!    blocking worker threads because pdfium is synchronous
//! 3. [`lines`]: bucket glyphs into rows, optionally per column
//! 4. [`heading`]: title, degree type and faculties from font size and
//!    keywords
//! 5. [`plan`]: the year/subject state machine
//! 6. [`sections`]: the two free-text sections between their markers
//!
//! [`normalize`] holds the text folding shared by the classifiers.

pub mod decode;
pub mod heading;
pub mod input;
pub mod lines;
pub mod normalize;
pub mod plan;
pub mod sections;
