//! Free-text section extraction from the two-column sections page.
//!
//! Input is the page's lines in two-column reading order, joined with
//! newlines. Each marker is located at its first occurrence independently.
//! The knowledge section runs from the knowledge marker to the next
//! outcomes marker after it (or the end of the text); the outcomes section
//! runs from the first outcomes marker to the end. When "Salidas" precedes
//! "Conocimientos" the outcomes section therefore contains the knowledge
//! heading and body too. The heading words that follow each marker ("que se
//! adquieren", "profesionales") are stripped once, case-insensitively.
//!
//! Markers are matched literally and case-sensitively against the flattened
//! text. A marker word that also occurs inside body text before the real
//! heading will cut the section early; documents of the target family do
//! not do that, and no attempt is made to disambiguate.

use crate::config::LayoutProfile;
use regex::RegexBuilder;

/// The two free-text sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub knowledge: String,
    pub outcomes: String,
}

/// Locate both sections. `None` when either marker is missing.
pub fn extract_sections(text: &str, profile: &LayoutProfile) -> Option<Sections> {
    let knowledge_marker = profile.knowledge_marker.as_str();
    let outcomes_marker = profile.outcomes_marker.as_str();

    let k_start = text.find(knowledge_marker)? + knowledge_marker.len();
    let o_start = text.find(outcomes_marker)? + outcomes_marker.len();

    let after_knowledge = &text[k_start..];
    let knowledge_part = after_knowledge
        .find(outcomes_marker)
        .map_or(after_knowledge, |end| &after_knowledge[..end]);
    let outcomes_part = &text[o_start..];

    Some(Sections {
        knowledge: strip_heading(knowledge_part, &profile.knowledge_heading)
            .trim()
            .to_string(),
        outcomes: strip_heading(outcomes_part, &profile.outcomes_heading)
            .trim()
            .to_string(),
    })
}

/// Remove `phrase` (and surrounding whitespace) from the start of `text`, once.
fn strip_heading(text: &str, phrase: &str) -> String {
    let pattern = format!(r"^\s*{}\s*", regex::escape(phrase));
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.replacen(text, 1, "").into_owned(),
        Err(_) => text.to_string(),
    }
}
