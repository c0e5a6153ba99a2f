//! Input resolution: find the documents of a batch and decode each one into
//! a [`Document`] through the right [`GlyphSource`].
//!
//! Two input kinds are recognised by file name:
//!
//! | Suffix | Source |
//! |--------|--------|
//! | `.pdf` | [`PdfiumSource`] (pdfium bound lazily, on the first PDF) |
//! | `.glyphs.json` | [`GlyphDumpSource`] (no native library needed) |
//!
//! Local files are validated before decoding so callers get a meaningful
//! error (missing, unreadable, not a PDF) rather than a pdfium failure.

use super::decode::{file_name, PdfiumSource};
use crate::config::ExtractionConfig;
use crate::document::{Document, GlyphDump};
use crate::error::ExtractError;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Suffix of glyph-dump files.
pub const GLYPH_DUMP_SUFFIX: &str = ".glyphs.json";

/// Decodes a source file into pages of glyphs.
///
/// Implementations are shared by concurrent workers.
pub trait GlyphSource: Send + Sync {
    fn read(&self, path: &Path) -> Result<Document, ExtractError>;
}

/// What kind of input a path is, judged by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    GlyphDump,
}

impl InputKind {
    pub fn of(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.ends_with(GLYPH_DUMP_SUFFIX) {
            Some(InputKind::GlyphDump)
        } else if name.ends_with(".pdf") {
            Some(InputKind::Pdf)
        } else {
            None
        }
    }
}

/// Reads `*.glyphs.json` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlyphDumpSource;

impl GlyphSource for GlyphDumpSource {
    fn read(&self, path: &Path) -> Result<Document, ExtractError> {
        let raw = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let dump: GlyphDump =
            serde_json::from_str(&raw).map_err(|e| ExtractError::InvalidGlyphDump {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        debug!("Loaded glyph dump {} ({} pages)", path.display(), dump.pages.len());
        Ok(Document::new(
            file_name(path),
            dump.pages.into_iter().map(Ok).collect(),
        ))
    }
}

/// Dispatches on [`InputKind`]; binds pdfium only when a PDF shows up.
pub struct AnySource {
    pdfium_lib_path: Option<PathBuf>,
    password: Option<String>,
    pdfium: OnceLock<Result<PdfiumSource, String>>,
}

impl AnySource {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            pdfium_lib_path: config.pdfium_lib_path.clone(),
            password: config.password.clone(),
            pdfium: OnceLock::new(),
        }
    }

    fn pdfium(&self) -> Result<&PdfiumSource, ExtractError> {
        self.pdfium
            .get_or_init(|| {
                PdfiumSource::bind(self.pdfium_lib_path.as_deref(), self.password.clone())
                    .map_err(|e| match e {
                        ExtractError::PdfiumBindingFailed(detail) => detail,
                        other => other.to_string(),
                    })
            })
            .as_ref()
            .map_err(|detail| ExtractError::PdfiumBindingFailed(detail.clone()))
    }
}

impl GlyphSource for AnySource {
    fn read(&self, path: &Path) -> Result<Document, ExtractError> {
        match validate_input(path)? {
            InputKind::Pdf => self.pdfium()?.read(path),
            InputKind::GlyphDump => GlyphDumpSource.read(path),
        }
    }
}

/// Check the file exists, is readable and, for PDFs, carries the `%PDF` magic.
pub fn validate_input(path: &Path) -> Result<InputKind, ExtractError> {
    let kind = InputKind::of(path).ok_or_else(|| ExtractError::UnsupportedInput {
        path: path.to_path_buf(),
    })?;

    if !path.exists() {
        return Err(ExtractError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut f = std::fs::File::open(path).map_err(|e| io_error(path, e))?;
    if kind == InputKind::Pdf {
        use std::io::Read;
        let mut magic = [0u8; 4];
        if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
            return Err(ExtractError::NotAPdf {
                path: path.to_path_buf(),
                magic,
            });
        }
    }

    Ok(kind)
}

/// Supported input files directly inside `dir`, sorted by name.
pub fn list_inputs(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ExtractError::InputDirUnreadable {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ExtractError::InputDirUnreadable {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_file() && InputKind::of(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();
    debug!("Found {} input documents in {}", paths.len(), dir.display());
    Ok(paths)
}

/// Record path for `input`: same base name, new extension, in `output_dir`.
///
/// `turismo.pdf` and `turismo.glyphs.json` both map to `turismo.<ext>`.
pub fn output_path_for(input: &Path, output_dir: &Path, extension: &str) -> PathBuf {
    let name = file_name(input);
    let lower = name.to_lowercase();
    let dump_base = lower
        .ends_with(GLYPH_DUMP_SUFFIX)
        .then(|| name.len().checked_sub(GLYPH_DUMP_SUFFIX.len()))
        .flatten()
        .and_then(|end| name.get(..end));
    let base = match dump_base {
        Some(base) => base,
        None => input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name.as_str()),
    };
    output_dir.join(format!("{base}.{extension}"))
}

fn io_error(path: &Path, e: std::io::Error) -> ExtractError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::NotFound => ExtractError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ExtractError::Internal(format!("reading {}: {e}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind() {
        assert_eq!(InputKind::of(Path::new("a/turismo.pdf")), Some(InputKind::Pdf));
        assert_eq!(InputKind::of(Path::new("TURISMO.PDF")), Some(InputKind::Pdf));
        assert_eq!(
            InputKind::of(Path::new("turismo.glyphs.json")),
            Some(InputKind::GlyphDump)
        );
        assert_eq!(InputKind::of(Path::new("turismo.json")), None);
        assert_eq!(InputKind::of(Path::new("notes.txt")), None);
    }

    #[test]
    fn test_output_path_for() {
        let out = Path::new("/out");
        assert_eq!(
            output_path_for(Path::new("/in/turismo.pdf"), out, "json"),
            PathBuf::from("/out/turismo.json")
        );
        assert_eq!(
            output_path_for(Path::new("/in/enfermeria.glyphs.json"), out, "json"),
            PathBuf::from("/out/enfermeria.json")
        );
        assert_eq!(
            output_path_for(Path::new("/in/a.b.pdf"), out, "record"),
            PathBuf::from("/out/a.b.record")
        );
    }

    #[test]
    fn test_validate_rejects_fake_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"<html>").unwrap();
        assert!(matches!(
            validate_input(&path),
            Err(ExtractError::NotAPdf { magic, .. }) if &magic == b"<htm"
        ));
    }

    #[test]
    fn test_validate_missing_and_unsupported() {
        assert!(matches!(
            validate_input(Path::new("/nonexistent/x.pdf")),
            Err(ExtractError::FileNotFound { .. })
        ));
        assert!(matches!(
            validate_input(Path::new("notes.txt")),
            Err(ExtractError::UnsupportedInput { .. })
        ));
    }

    #[test]
    fn test_list_inputs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.glyphs.json", "c.txt", "d.json"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.pdf")).unwrap();
        let names: Vec<_> = list_inputs(dir.path())
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();
        assert_eq!(names, vec!["a.glyphs.json", "b.pdf"]);
    }

    #[test]
    fn test_glyph_dump_source_reads_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.glyphs.json");
        std::fs::write(
            &path,
            r#"{"pages":[{"width":600,"height":800,"glyphs":[{"char":"G","x0":1,"top":2,"size":40}]},{"width":600,"glyphs":[]}]}"#,
        )
        .unwrap();
        let doc = GlyphDumpSource.read(&path).unwrap();
        assert_eq!(doc.name, "t.glyphs.json");
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_glyph_dump_source_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.glyphs.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            GlyphDumpSource.read(&path),
            Err(ExtractError::InvalidGlyphDump { .. })
        ));
    }

    #[test]
    fn test_any_source_reads_dump_without_pdfium() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.glyphs.json");
        std::fs::write(&path, r#"{"pages":[]}"#).unwrap();
        let source = AnySource::new(&ExtractionConfig::default());
        assert_eq!(source.read(&path).unwrap().page_count(), 0);
    }
}
