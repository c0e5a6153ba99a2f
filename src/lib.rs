//! # degree-layout
//!
//! Turn university degree brochures (PDF) into structured degree records:
//! title, degree type, faculties, the study plan by academic year, and the
//! "knowledge acquired" and "career outcomes" sections.
//!
//! The brochures carry no tagged structure. Everything is recovered from the
//! geometry of the text layer: each glyph's character, horizontal position,
//! vertical position and font size.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / glyph dump
//!  │
//!  ├─ 1. Input     list the batch, validate each file
//!  ├─ 2. Decode    text layer → glyphs via pdfium (spawn_blocking)
//!  ├─ 3. Lines     bucket glyphs into rows; split the sections page in two
//!  ├─ 4. Classify  heading fields, study-plan state machine, section markers
//!  └─ 5. Output    one JSON record per document + batch summary
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use degree_layout::{extract_dir, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let summary = extract_dir("brochures/", "records/", &config).await?;
//!     eprintln!("{}/{} extracted, {} issues",
//!         summary.extracted, summary.total_documents, summary.total_issues);
//!     Ok(())
//! }
//! ```
//!
//! Single documents can be assembled without touching the file system:
//!
//! ```rust
//! use degree_layout::{assemble_record, Document, LayoutProfile, Page};
//!
//! let doc = Document::new("empty.pdf", vec![Ok(Page::default()); 3]);
//! let extraction = assemble_record(&doc, &LayoutProfile::default()).unwrap();
//! assert!(extraction.record.study_plan.is_empty());
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `degree2json` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! degree-layout = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::{render_subjects, CatalogEntry, DegreeSubjects, RecordCatalog, SectionKind, SectionPassage};
pub use config::{ExtractionConfig, ExtractionConfigBuilder, LayoutProfile, PageRoles};
pub use document::{Document, Glyph, GlyphDump, Page};
pub use error::{ExtractError, ExtractionIssue, PageError};
pub use extract::{
    assemble_record, extract_dir, extract_dir_sync, extract_file, extract_from_bytes, inspect,
    inspect_document, write_record, Inspection, PageLines,
};
pub use output::{
    BatchSummary, DegreeRecord, DocumentReport, DocumentStatus, Extraction, StudyPlan,
    SubjectEntry, YearLabel,
};
pub use pipeline::decode::PdfiumSource;
pub use pipeline::input::{AnySource, GlyphDumpSource, GlyphSource};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{extract_stream, extract_stream_with, RecordStream};
