//! Output types: the structured record produced for each document, and the
//! per-document and per-batch reports around it.
//!
//! The serialized field names of [`DegreeRecord`] and the year/subject/credit
//! sub-structure of [`StudyPlan`] are read by downstream indexing and
//! retrieval code, so their shape is fixed:
//!
//! ```json
//! {
//!   "degree_title": "GRADO EN TURISMO",
//!   "degree_type": "Grado",
//!   "faculties": ["Facultad de Comercio y Turismo"],
//!   "plan_estudios": {
//!     "PRIMER CURSO": [{ "subject": "Economía", "ects": "6" }]
//!   },
//!   "conocimientos": "…",
//!   "salidas_profesionales": "…"
//! }
//! ```

use crate::error::{ExtractError, ExtractionIssue};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ── Study plan ───────────────────────────────────────────────────────────

/// One of the fixed academic-year buckets of a study plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum YearLabel {
    #[serde(rename = "PRIMER CURSO")]
    First,
    #[serde(rename = "SEGUNDO CURSO")]
    Second,
    #[serde(rename = "TERCER CURSO")]
    Third,
    #[serde(rename = "CUARTO CURSO")]
    Fourth,
    #[serde(rename = "QUINTO CURSO")]
    Fifth,
    #[serde(rename = "SEXTO CURSO")]
    Sixth,
}

impl YearLabel {
    pub const ALL: [YearLabel; 6] = [
        YearLabel::First,
        YearLabel::Second,
        YearLabel::Third,
        YearLabel::Fourth,
        YearLabel::Fifth,
        YearLabel::Sixth,
    ];

    /// Canonical label, as written into `plan_estudios`.
    pub fn as_str(self) -> &'static str {
        match self {
            YearLabel::First => "PRIMER CURSO",
            YearLabel::Second => "SEGUNDO CURSO",
            YearLabel::Third => "TERCER CURSO",
            YearLabel::Fourth => "CUARTO CURSO",
            YearLabel::Fifth => "QUINTO CURSO",
            YearLabel::Sixth => "SEXTO CURSO",
        }
    }

    /// Map a folded (lowercase, diacritic-free) ordinal word to its year.
    pub fn from_ordinal(word: &str) -> Option<Self> {
        match word {
            "primer" => Some(YearLabel::First),
            "segundo" => Some(YearLabel::Second),
            "tercer" => Some(YearLabel::Third),
            "cuarto" => Some(YearLabel::Fourth),
            "quinto" => Some(YearLabel::Fifth),
            "sexto" => Some(YearLabel::Sixth),
            _ => None,
        }
    }
}

impl fmt::Display for YearLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One subject of the plan and its credit load.
///
/// `credits` keeps the document's notation verbatim (`"4,5"`, `"6 + 3"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectEntry {
    #[serde(rename = "subject")]
    pub name: String,
    #[serde(rename = "ects")]
    pub credits: String,
}

impl SubjectEntry {
    pub fn new(name: impl Into<String>, credits: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            credits: credits.into(),
        }
    }
}

/// Year → subjects table, in the order years were first declared.
///
/// Stored as a vector of pairs rather than a hash map so that both the year
/// order and the subject order survive serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudyPlan {
    years: Vec<(YearLabel, Vec<SubjectEntry>)>,
}

impl StudyPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `year` with an empty subject list.
    ///
    /// A year declared twice keeps its original position but loses the
    /// subjects collected so far; the number discarded is returned.
    pub fn declare_year(&mut self, year: YearLabel) -> usize {
        match self.years.iter_mut().find(|(y, _)| *y == year) {
            Some((_, subjects)) => {
                let discarded = subjects.len();
                subjects.clear();
                discarded
            }
            None => {
                self.years.push((year, Vec::new()));
                0
            }
        }
    }

    /// Append a subject under an already declared year.
    ///
    /// Returns `false` (and stores nothing) when `year` was never declared.
    pub fn push(&mut self, year: YearLabel, entry: SubjectEntry) -> bool {
        match self.years.iter_mut().find(|(y, _)| *y == year) {
            Some((_, subjects)) => {
                subjects.push(entry);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, year: YearLabel) -> Option<&[SubjectEntry]> {
        self.years
            .iter()
            .find(|(y, _)| *y == year)
            .map(|(_, s)| s.as_slice())
    }

    pub fn years(&self) -> impl Iterator<Item = YearLabel> + '_ {
        self.years.iter().map(|(y, _)| *y)
    }

    pub fn iter(&self) -> impl Iterator<Item = (YearLabel, &[SubjectEntry])> {
        self.years.iter().map(|(y, s)| (*y, s.as_slice()))
    }

    /// Every subject in year order, then row order.
    pub fn subjects(&self) -> impl Iterator<Item = &SubjectEntry> {
        self.years.iter().flat_map(|(_, s)| s.iter())
    }

    pub fn subject_count(&self) -> usize {
        self.years.iter().map(|(_, s)| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

impl Serialize for StudyPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.years.len()))?;
        for (year, subjects) in &self.years {
            map.serialize_entry(year, subjects)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StudyPlan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PlanVisitor;

        impl<'de> Visitor<'de> for PlanVisitor {
            type Value = StudyPlan;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from year label to a list of subjects")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<StudyPlan, A::Error> {
                let mut plan = StudyPlan::new();
                while let Some((year, subjects)) =
                    access.next_entry::<YearLabel, Vec<SubjectEntry>>()?
                {
                    plan.declare_year(year);
                    for entry in subjects {
                        plan.push(year, entry);
                    }
                }
                Ok(plan)
            }
        }

        deserializer.deserialize_map(PlanVisitor)
    }
}

// ── Record ───────────────────────────────────────────────────────────────

/// The structured description of one degree programme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeRecord {
    #[serde(rename = "degree_title")]
    pub title: String,
    #[serde(rename = "degree_type")]
    pub degree_type: String,
    pub faculties: Vec<String>,
    #[serde(rename = "plan_estudios")]
    pub study_plan: StudyPlan,
    #[serde(rename = "conocimientos")]
    pub knowledge: String,
    #[serde(rename = "salidas_profesionales")]
    pub outcomes: String,
}

impl DegreeRecord {
    /// Serialize the record as the pretty-printed JSON written to disk.
    pub fn to_json(&self) -> Result<String, ExtractError> {
        serde_json::to_string_pretty(self)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| ExtractError::Internal(format!("record serialisation: {e}")))
    }
}

/// A record together with the data-quality issues met while building it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub record: DegreeRecord,
    pub issues: Vec<ExtractionIssue>,
}

// ── Reports ──────────────────────────────────────────────────────────────

/// What happened to one input document in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Input file name (no directory).
    pub name: String,
    pub status: DocumentStatus,
    /// Where the record was written, if it was.
    pub output: Option<String>,
    /// Subjects found in the study plan.
    pub subjects: usize,
    pub issues: Vec<ExtractionIssue>,
    /// Error message for skipped or failed documents.
    pub error: Option<String>,
    pub duration_ms: u64,
    /// The record itself; populated by the streaming API only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub record: Option<DegreeRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// A record was produced (and written, in batch mode).
    Extracted,
    /// The output already existed and overwriting was disabled.
    Unchanged,
    /// The document had fewer pages than the layout needs.
    Skipped,
    /// Any other per-document error.
    Failed,
}

/// Totals for one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_documents: usize,
    pub extracted: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Issues of every kind, across all documents.
    pub total_issues: usize,
    /// Plan lines discarded because no year header preceded them.
    pub orphan_plan_lines: usize,
    /// Subject fragments dropped for lack of a credits line.
    pub dropped_fragments: usize,
    pub total_duration_ms: u64,
    /// Per-document reports, sorted by name.
    pub documents: Vec<DocumentReport>,
}

impl BatchSummary {
    pub(crate) fn from_reports(mut documents: Vec<DocumentReport>, total_duration_ms: u64) -> Self {
        documents.sort_by(|a, b| a.name.cmp(&b.name));
        let count = |status| documents.iter().filter(|d| d.status == status).count();
        let issues = documents.iter().flat_map(|d| d.issues.iter());
        let mut orphan_plan_lines = 0;
        let mut dropped_fragments = 0;
        let mut total_issues = 0;
        for issue in issues {
            total_issues += 1;
            match issue {
                ExtractionIssue::NoYearDetected { orphan_lines } => orphan_plan_lines += orphan_lines,
                ExtractionIssue::UnterminatedSubjectBuffer { .. } => dropped_fragments += 1,
                _ => {}
            }
        }
        Self {
            total_documents: documents.len(),
            extracted: count(DocumentStatus::Extracted),
            unchanged: count(DocumentStatus::Unchanged),
            skipped: count(DocumentStatus::Skipped),
            failed: count(DocumentStatus::Failed),
            total_issues,
            orphan_plan_lines,
            dropped_fragments,
            total_duration_ms,
            documents,
        }
    }
}
