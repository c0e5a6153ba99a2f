//! Record assembly and batch extraction entry points.
//!
//! ```text
//! Document ─┬─ title page ──── lines ─────────▶ heading  ─┐
//!           ├─ plan page ───── lines ─────────▶ plan     ─┼─▶ DegreeRecord
//!           └─ sections page ─ column lines ──▶ sections ─┘
//! ```
//!
//! [`assemble_record`] is pure: same document in, byte-identical record
//! out. The batch runner ([`extract_dir`]) fans documents out to blocking
//! worker threads, writes one record file per document, and never lets one
//! document's failure stop the others.

use crate::config::{ExtractionConfig, LayoutProfile};
use crate::document::{Document, Page};
use crate::error::{ExtractError, ExtractionIssue, PageError};
use crate::output::{
    BatchSummary, DegreeRecord, DocumentReport, DocumentStatus, Extraction,
};
use crate::pipeline::decode::file_name;
use crate::pipeline::heading::classify_heading;
use crate::pipeline::input::{self, AnySource, GlyphSource};
use crate::pipeline::lines::{reconstruct_columns, reconstruct_lines, Line};
use crate::pipeline::plan::parse_study_plan;
use crate::pipeline::sections::extract_sections;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Build the record for one decoded document.
///
/// # Errors
/// Only [`ExtractError::MissingPage`]: every other problem degrades the
/// affected fields to their empty defaults and is listed in
/// [`Extraction::issues`].
pub fn assemble_record(doc: &Document, profile: &LayoutProfile) -> Result<Extraction, ExtractError> {
    let roles = profile.pages;
    let required = roles.required_pages();
    if doc.page_count() < required {
        return Err(ExtractError::MissingPage {
            path: PathBuf::from(&doc.name),
            required,
            found: doc.page_count(),
        });
    }

    let mut record = DegreeRecord::default();
    let mut issues = Vec::new();

    if let Some(page) = role_page(doc, roles.title, &mut issues) {
        let lines = reconstruct_lines(&page.glyphs, profile.row_tolerance);
        let heading = classify_heading(&lines, profile);
        if heading.title.is_empty() {
            issues.push(ExtractionIssue::NoHeadingFound);
        }
        record.title = heading.title;
        record.degree_type = heading.degree_type;
        record.faculties = heading.faculties;
    }

    if let Some(page) = role_page(doc, roles.plan, &mut issues) {
        let lines = reconstruct_lines(&page.glyphs, profile.row_tolerance);
        let parsed = parse_study_plan(&lines, profile);
        record.study_plan = parsed.plan;
        issues.extend(parsed.issues);
    }

    if let Some(page) = role_page(doc, roles.sections, &mut issues) {
        let columns = reconstruct_columns(page, profile.column_row_tolerance);
        match extract_sections(&columns.text(), profile) {
            Some(sections) => {
                record.knowledge = sections.knowledge;
                record.outcomes = sections.outcomes;
            }
            None => issues.push(ExtractionIssue::SectionMarkersAbsent),
        }
    }

    debug!(
        "Assembled {}: title={:?}, {} subjects, {} issues",
        doc.name,
        record.title,
        record.study_plan.subject_count(),
        issues.len()
    );

    Ok(Extraction { record, issues })
}

/// The decoded page for a role, or `None` (plus an issue) when it failed.
fn role_page<'a>(
    doc: &'a Document,
    page_num: usize,
    issues: &mut Vec<ExtractionIssue>,
) -> Option<&'a Page> {
    match doc.page(page_num)? {
        Ok(page) => Some(page),
        Err(e) => {
            warn!("{}: {}", doc.name, e);
            let issue = ExtractionIssue::PageUnreadable { page: page_num };
            if !issues.contains(&issue) {
                issues.push(issue);
            }
            None
        }
    }
}

/// Decode and assemble one file.
pub fn extract_file(
    path: impl AsRef<Path>,
    source: &dyn GlyphSource,
    profile: &LayoutProfile,
) -> Result<Extraction, ExtractError> {
    let path = path.as_ref();
    let doc = source.read(path)?;
    assemble_record(&doc, profile).map_err(|e| match e {
        ExtractError::MissingPage {
            required, found, ..
        } => ExtractError::MissingPage {
            path: path.to_path_buf(),
            required,
            found,
        },
        other => other,
    })
}

/// Extract the record of a PDF held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed on return.
pub fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<Extraction, ExtractError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    let source = AnySource::new(config);
    extract_file(tmp.path(), &source, &config.profile)
}

/// Write a record atomically: temp file in the target directory, then rename.
pub fn write_record(record: &DegreeRecord, path: &Path) -> Result<(), ExtractError> {
    let write_err = |source| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    let json = record.to_json()?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Extract every supported document in `input_dir`, writing one record per
/// document into `output_dir`.
///
/// Per-document errors are logged with the document name and recorded in
/// the returned [`BatchSummary`]; they never abort the batch.
///
/// # Errors
/// Only when `input_dir` cannot be listed or `output_dir` cannot be created.
pub async fn extract_dir(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<BatchSummary, ExtractError> {
    let total_start = Instant::now();
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref().to_path_buf();
    info!(
        "Starting extraction: {} → {}",
        input_dir.display(),
        output_dir.display()
    );

    let paths = input::list_inputs(input_dir)?;
    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: output_dir.clone(),
            source: e,
        })?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(paths.len());
    }

    let source: Arc<dyn GlyphSource> = Arc::new(AnySource::new(config));
    let reports = run_batch(paths, source, config, Some(output_dir)).await;
    let summary = BatchSummary::from_reports(reports, total_start.elapsed().as_millis() as u64);

    info!(
        "Extraction complete: {}/{} extracted, {} skipped, {} failed, {} issues, {}ms",
        summary.extracted,
        summary.total_documents,
        summary.skipped,
        summary.failed,
        summary.total_issues,
        summary.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(summary.total_documents, summary.extracted);
    }

    Ok(summary)
}

/// Synchronous wrapper around [`extract_dir`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_dir_sync(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<BatchSummary, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_dir(input_dir, output_dir, config))
}

/// Fan documents out to blocking workers, `config.concurrency` at a time.
pub(crate) async fn run_batch(
    paths: Vec<PathBuf>,
    source: Arc<dyn GlyphSource>,
    config: &ExtractionConfig,
    output_dir: Option<PathBuf>,
) -> Vec<DocumentReport> {
    stream::iter(paths.into_iter().map(|path| {
        spawn_document(path, Arc::clone(&source), config.clone(), output_dir.clone())
    }))
    .buffer_unordered(config.concurrency.max(1))
    .collect()
    .await
}

/// Run one document on the blocking pool; a panicking worker becomes a
/// `Failed` report.
pub(crate) async fn spawn_document(
    path: PathBuf,
    source: Arc<dyn GlyphSource>,
    config: ExtractionConfig,
    output_dir: Option<PathBuf>,
) -> DocumentReport {
    let name = file_name(&path);
    let cb = config.progress_callback.clone();
    let joined = tokio::task::spawn_blocking(move || {
        run_document(&path, source.as_ref(), &config, output_dir.as_deref())
    })
    .await;

    joined.unwrap_or_else(|e| {
        let error = format!("Extraction task panicked: {e}");
        warn!("{}: {}", name, error);
        if let Some(ref cb) = cb {
            cb.on_document_error(&name, &error);
        }
        failed_report(name, DocumentStatus::Failed, error, 0)
    })
}

/// Extract one document and, when `output_dir` is set, write its record.
///
/// Without an output directory the record travels inside the report.
pub(crate) fn run_document(
    path: &Path,
    source: &dyn GlyphSource,
    config: &ExtractionConfig,
    output_dir: Option<&Path>,
) -> DocumentReport {
    let start = Instant::now();
    let name = file_name(path);
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_document_start(&name);
    }

    let target = output_dir.map(|dir| input::output_path_for(path, dir, &config.output_extension));
    if let Some(ref target) = target {
        if !config.overwrite && target.exists() {
            debug!("{}: {} exists, leaving it", name, target.display());
            if let Some(cb) = cb {
                cb.on_document_complete(&name, 0, 0);
            }
            return DocumentReport {
                name,
                status: DocumentStatus::Unchanged,
                output: Some(target.display().to_string()),
                subjects: 0,
                issues: Vec::new(),
                error: None,
                duration_ms: start.elapsed().as_millis() as u64,
                record: None,
            };
        }
    }

    let outcome = extract_file(path, source, &config.profile).and_then(|extraction| {
        if let Some(ref target) = target {
            write_record(&extraction.record, target)?;
        }
        Ok(extraction)
    });
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(Extraction { record, issues }) => {
            for issue in &issues {
                warn!("{}: {}", name, issue);
            }
            let subjects = record.study_plan.subject_count();
            info!(
                "Extracted {} ({} subjects, {} issues) in {}ms",
                name,
                subjects,
                issues.len(),
                duration_ms
            );
            if let Some(cb) = cb {
                cb.on_document_complete(&name, subjects, issues.len());
            }
            DocumentReport {
                name,
                status: DocumentStatus::Extracted,
                output: target.map(|t| t.display().to_string()),
                subjects,
                issues,
                error: None,
                duration_ms,
                record: if output_dir.is_none() { Some(record) } else { None },
            }
        }
        Err(e) => {
            let status = match e {
                ExtractError::MissingPage { .. } => DocumentStatus::Skipped,
                _ => DocumentStatus::Failed,
            };
            warn!("Skipping {}: {}", name, e);
            if let Some(cb) = cb {
                cb.on_document_error(&name, &e.to_string());
            }
            failed_report(name, status, e.to_string(), duration_ms)
        }
    }
}

fn failed_report(name: String, status: DocumentStatus, error: String, duration_ms: u64) -> DocumentReport {
    DocumentReport {
        name,
        status,
        output: None,
        subjects: 0,
        issues: Vec::new(),
        error: Some(error),
        duration_ms,
        record: None,
    }
}

// ── Inspection ───────────────────────────────────────────────────────────

/// Reconstructed lines of every page, for debugging a document family.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub name: String,
    pub pages: Vec<PageLines>,
    /// Two-column reading order of the sections page, if it decoded.
    pub sections_text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageLines {
    /// 1-indexed.
    pub page: usize,
    pub lines: Vec<Line>,
    pub error: Option<PageError>,
}

/// Decode a file and show what the line reconstructor sees.
///
/// Does not classify anything and never fails on a short document.
pub fn inspect(
    path: impl AsRef<Path>,
    source: &dyn GlyphSource,
    profile: &LayoutProfile,
) -> Result<Inspection, ExtractError> {
    let doc = source.read(path.as_ref())?;
    Ok(inspect_document(&doc, profile))
}

pub fn inspect_document(doc: &Document, profile: &LayoutProfile) -> Inspection {
    let pages = doc
        .pages
        .iter()
        .enumerate()
        .map(|(idx, page)| match page {
            Ok(p) => PageLines {
                page: idx + 1,
                lines: reconstruct_lines(&p.glyphs, profile.row_tolerance),
                error: None,
            },
            Err(e) => PageLines {
                page: idx + 1,
                lines: Vec::new(),
                error: Some(e.clone()),
            },
        })
        .collect();

    let sections_text = match doc.page(profile.pages.sections) {
        Some(Ok(p)) => Some(reconstruct_columns(p, profile.column_row_tolerance).text()),
        _ => None,
    };

    Inspection {
        name: doc.name.clone(),
        pages,
        sections_text,
    }
}
