//! Error types for the degree-layout library.
//!
//! Three distinct types reflect three distinct failure modes:
//!
//! * [`ExtractError`]: **Fatal for one document** (or for the whole batch
//!   when the input directory itself is unusable): bad input file, wrong
//!   password, fewer pages than the layout requires. Batch entry points log
//!   it against the document name and move on to the next document.
//!
//! * [`PageError`]: **Non-fatal**: one page of a document could not be
//!   decoded into glyphs. The slot stays in [`crate::document::Document`] so
//!   only the fields drawn from that page fall back to their defaults.
//!
//! * [`ExtractionIssue`]: **Data quality**: the document was read fine but a
//!   heuristic found nothing to work with (no title line, no year header,
//!   missing section markers). Issues never change the record shape; they are
//!   reported next to it in [`crate::output::DocumentReport`].

use std::path::PathBuf;
use thiserror::Error;

use crate::output::YearLabel;

/// All fatal errors returned by the degree-layout library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension maps to no glyph source.
    #[error("Unsupported input '{path}': expected a .pdf file or a .glyphs.json glyph dump")]
    UnsupportedInput { path: PathBuf },

    /// The file has a `.pdf` extension but not the `%PDF` magic bytes.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// A glyph dump could not be parsed.
    #[error("Invalid glyph dump '{path}': {detail}")]
    InvalidGlyphDump { path: PathBuf, detail: String },

    /// The batch input directory could not be listed.
    #[error("Cannot read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The document has fewer pages than the title/plan/sections roles need.
    #[error("'{path}' has {found} pages but the layout needs at least {required}")]
    MissingPage {
        path: PathBuf,
        required: usize,
        found: usize,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write a record file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or profile validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Pass --pdfium-lib /path/to/libpdfium.\n\
  • Place libpdfium next to the working directory.\n\
Glyph dumps (.glyphs.json) do not need pdfium at all.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page exists but its text layer could not be read.
    #[error("Page {page}: text layer unavailable: {detail}")]
    TextUnavailable { page: usize, detail: String },
}

/// A data-quality observation made while extracting one document.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionIssue {
    /// No line on the title page reached the title font size.
    #[error("no title-sized line on the title page")]
    NoHeadingFound,

    /// Lines on the plan page appeared before the first year header.
    #[error("{orphan_lines} plan lines appeared before any year header")]
    NoYearDetected { orphan_lines: usize },

    /// A wrapped subject name never reached a line ending in credits.
    #[error("dropped unterminated subject fragment under {year}: '{fragment}'")]
    UnterminatedSubjectBuffer { year: YearLabel, fragment: String },

    /// A year header appeared twice; the subjects collected so far were reset.
    #[error("{year} declared again, {discarded} subjects discarded")]
    YearRedeclared { year: YearLabel, discarded: usize },

    /// The sections page lacks one or both markers.
    #[error("section markers absent on the sections page")]
    SectionMarkersAbsent,

    /// A page needed by the layout could not be decoded.
    #[error("page {page} unreadable, dependent fields left empty")]
    PageUnreadable { page: usize },
}
