//! Study-plan parsing: a line-driven state machine over the plan page.
//!
//! ## Line rules (first match wins)
//!
//! 1. **Year header**: an ordinal year word followed by "curso", matched on
//!    folded text so case, accents and spacing do not matter. Opens that
//!    year and abandons any buffered fragment.
//! 2. **Column header**: the line contains the ECTS token: skipped.
//! 3. **Before any year**: skipped and counted.
//! 4. **Credits row**: ends in a credit figure (`6`, `4,5`, `6 + 3`). The
//!    buffered fragment, if any, is prefixed to the name and the subject is
//!    committed.
//! 5. **Name fragment**: anything else. Table cells wrap long subject names,
//!    and the credit figure sits on the row where the name ends, so the
//!    fragment is buffered until a credits row arrives.
//!
//! ## States
//!
//! ```text
//!                 header                 fragment
//! AwaitingYear ──────────▶ InYear ───────────────────▶ Buffering
//!                           ▲  ▲ credits row               │  │ fragment
//!                           │  └───────────────────────────┘  └──▶ (append)
//!                           └─ header (fragment dropped) ──────────┘
//! ```
//!
//! A fragment still buffered at a new header or at the end of the page is
//! dropped from the plan and reported as
//! [`ExtractionIssue::UnterminatedSubjectBuffer`].

use super::lines::Line;
use super::normalize::fold;
use crate::config::LayoutProfile;
use crate::error::ExtractionIssue;
use crate::output::{StudyPlan, SubjectEntry, YearLabel};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_YEAR_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(primer|segundo|tercer|cuarto|quinto|sexto)\s+curso").unwrap()
});

static RE_TRAILING_CREDITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+[.,]?\d*(?:\s*\+\s*\d+[.,]?\d*)*)$").unwrap());

/// Year named by a header line, if the line is one.
pub fn detect_year_header(text: &str) -> Option<YearLabel> {
    let folded = fold(text);
    RE_YEAR_HEADER
        .captures(&folded)
        .and_then(|caps| YearLabel::from_ordinal(&caps[1]))
}

/// Split a line into `(name, credits)` when it ends in a credit figure.
///
/// Both parts are trimmed; the name may be empty.
pub fn split_trailing_credits(text: &str) -> Option<(&str, &str)> {
    RE_TRAILING_CREDITS
        .find(text)
        .map(|m| (text[..m.start()].trim(), m.as_str().trim()))
}

/// Parser state between lines.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PlanState {
    /// No year header seen yet.
    AwaitingYear,
    /// Inside a year, nothing buffered.
    InYear(YearLabel),
    /// Inside a year with the start of a wrapped subject name.
    Buffering(YearLabel, String),
}

/// The parsed plan plus what the parser had to throw away.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanParse {
    pub plan: StudyPlan,
    pub issues: Vec<ExtractionIssue>,
}

/// Parse the ordered lines of the plan page.
pub fn parse_study_plan(lines: &[Line], profile: &LayoutProfile) -> PlanParse {
    let ects_token = profile.ects_header_token.to_uppercase();
    let mut plan = StudyPlan::new();
    let mut issues = Vec::new();
    let mut orphan_lines = 0usize;
    let mut state = PlanState::AwaitingYear;

    for line in lines {
        let text = line.text.trim();

        if let Some(year) = detect_year_header(text) {
            if let PlanState::Buffering(prev, fragment) = state {
                issues.push(ExtractionIssue::UnterminatedSubjectBuffer {
                    year: prev,
                    fragment,
                });
            }
            let discarded = plan.declare_year(year);
            if discarded > 0 {
                issues.push(ExtractionIssue::YearRedeclared { year, discarded });
            }
            state = PlanState::InYear(year);
            continue;
        }

        if text.to_uppercase().contains(&ects_token) {
            continue;
        }

        state = match state {
            PlanState::AwaitingYear => {
                orphan_lines += 1;
                PlanState::AwaitingYear
            }
            PlanState::InYear(year) => match split_trailing_credits(text) {
                Some((name, credits)) => {
                    plan.push(year, SubjectEntry::new(name, credits));
                    PlanState::InYear(year)
                }
                None => PlanState::Buffering(year, text.to_string()),
            },
            PlanState::Buffering(year, mut fragment) => match split_trailing_credits(text) {
                Some((name, credits)) => {
                    fragment.push(' ');
                    fragment.push_str(name);
                    plan.push(year, SubjectEntry::new(fragment.trim(), credits));
                    PlanState::InYear(year)
                }
                None => {
                    fragment.push(' ');
                    fragment.push_str(text);
                    PlanState::Buffering(year, fragment)
                }
            },
        };
    }

    if let PlanState::Buffering(year, fragment) = state {
        issues.push(ExtractionIssue::UnterminatedSubjectBuffer { year, fragment });
    }
    if orphan_lines > 0 {
        issues.insert(0, ExtractionIssue::NoYearDetected { orphan_lines });
    }

    debug!(
        "Parsed study plan: {} years, {} subjects, {} issues",
        plan.years().count(),
        plan.subject_count(),
        issues.len()
    );

    PlanParse { plan, issues }
}
