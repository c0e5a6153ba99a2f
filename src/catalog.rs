//! Read-side helpers over a directory of extracted records.
//!
//! A [`RecordCatalog`] is an in-memory list of [`DegreeRecord`]s. It answers
//! two questions downstream consumers ask of the records:
//!
//! * which subjects does a degree have ([`RecordCatalog::subjects`],
//!   rendered as plain text by [`render_subjects`]);
//! * what free-text passages does the corpus hold
//!   ([`RecordCatalog::section_passages`]), ready for indexing.
//!
//! Degree lookup folds case and accents on both sides and requires every
//! query word to occur somewhere in the title, so `"enfermeria"` finds
//! `"GRADO EN ENFERMERÍA"`.

use crate::error::ExtractError;
use crate::output::DegreeRecord;
use crate::pipeline::decode::file_name;
use crate::pipeline::input::GLYPH_DUMP_SUFFIX;
use crate::pipeline::normalize::fold;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// A record plus the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub source: String,
    pub record: DegreeRecord,
}

#[derive(Debug, Clone, Default)]
pub struct RecordCatalog {
    entries: Vec<CatalogEntry>,
}

/// Subjects of one matching degree, in plan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegreeSubjects {
    pub degree_title: String,
    pub subjects: Vec<String>,
}

/// Which free-text section a passage was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionKind {
    #[serde(rename = "conocimientos")]
    Knowledge,
    #[serde(rename = "salidas_profesionales")]
    Outcomes,
}

/// An indexable passage with the metadata of its record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionPassage {
    pub text: String,
    pub degree: String,
    #[serde(rename = "type")]
    pub degree_type: String,
    pub faculties: Vec<String>,
    pub section: SectionKind,
    pub source_file: String,
}

impl RecordCatalog {
    /// Load every `*.json` record directly inside `dir`, in name order.
    ///
    /// Glyph dumps are ignored. Files that do not parse as a record are
    /// logged and skipped.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let dir = dir.as_ref();
        let read_err = |source| ExtractError::InputDirUnreadable {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            let name = file_name(&path).to_lowercase();
            if path.is_file() && name.ends_with(".json") && !name.ends_with(GLYPH_DUMP_SUFFIX) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let parsed = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|raw| serde_json::from_str::<DegreeRecord>(&raw).map_err(|e| e.to_string()));
            match parsed {
                Ok(record) => entries.push(CatalogEntry {
                    source: file_name(&path),
                    record,
                }),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        debug!("Loaded {} records from {}", entries.len(), dir.display());
        Ok(Self { entries })
    }

    pub fn from_records(records: impl IntoIterator<Item = (String, DegreeRecord)>) -> Self {
        Self {
            entries: records
                .into_iter()
                .map(|(source, record)| CatalogEntry { source, record })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records whose title contains every word of `query`, folded.
    ///
    /// An empty query matches everything.
    pub fn find(&self, query: &str) -> Vec<&DegreeRecord> {
        let words: Vec<String> = fold(query).split_whitespace().map(str::to_string).collect();
        self.entries
            .iter()
            .map(|e| &e.record)
            .filter(|r| {
                let title = fold(&r.title);
                words.iter().all(|w| title.contains(w.as_str()))
            })
            .collect()
    }

    /// Subject names of every degree matching `query`.
    pub fn subjects(&self, query: &str) -> Vec<DegreeSubjects> {
        self.find(query)
            .into_iter()
            .map(|r| DegreeSubjects {
                degree_title: r.title.clone(),
                subjects: r.study_plan.subjects().map(|s| s.name.clone()).collect(),
            })
            .collect()
    }

    /// Two passages per record: knowledge first, then outcomes.
    pub fn section_passages(&self) -> Vec<SectionPassage> {
        let mut out = Vec::with_capacity(self.entries.len() * 2);
        for CatalogEntry { source, record } in &self.entries {
            let passage = |section, text: String| SectionPassage {
                text,
                degree: record.title.clone(),
                degree_type: record.degree_type.clone(),
                faculties: record.faculties.clone(),
                section,
                source_file: source.clone(),
            };
            out.push(passage(
                SectionKind::Knowledge,
                format!(
                    "Conocimientos para el grado de {}: {}",
                    record.title, record.knowledge
                ),
            ));
            out.push(passage(
                SectionKind::Outcomes,
                format!(
                    "Salidas profesionales para el grado de {}: {}",
                    record.title, record.outcomes
                ),
            ));
        }
        out
    }
}

/// Plain-text listing, one block per degree followed by a blank line.
///
/// ```text
/// Grado: GRADO EN TURISMO
/// Asignaturas:
///   - Economía
///   - Marketing
///
/// ```
pub fn render_subjects(matches: &[DegreeSubjects]) -> String {
    let mut lines = Vec::new();
    for m in matches {
        lines.push(format!("Grado: {}", m.degree_title));
        lines.push("Asignaturas:".to_string());
        lines.extend(m.subjects.iter().map(|s| format!("  - {s}")));
        lines.push(String::new());
    }
    lines.join("\n")
}
