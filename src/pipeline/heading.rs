//! Heading classification on the title page.
//!
//! Font size and two keyword tokens are the only signals:
//!
//! * **title**: every line at or above `title_min_font_size`, joined with a
//!   space in line order;
//! * **degree type**: the first line below the threshold that contains the
//!   degree token;
//! * **faculties**: every line, any size, that contains the faculty token,
//!   duplicates kept.

use super::lines::Line;
use super::normalize::contains_ci;
use crate::config::LayoutProfile;

/// Title-page fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Heading {
    pub title: String,
    pub degree_type: String,
    pub faculties: Vec<String>,
}

/// Classify the lines of the title page (no column split).
pub fn classify_heading(lines: &[Line], profile: &LayoutProfile) -> Heading {
    let threshold = profile.title_min_font_size;

    let title = lines
        .iter()
        .filter(|l| l.avg_font_size >= threshold)
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();

    let degree_type = lines
        .iter()
        .find(|l| l.avg_font_size < threshold && contains_ci(&l.text, &profile.degree_token))
        .map(|l| l.text.trim().to_string())
        .unwrap_or_default();

    let faculties = lines
        .iter()
        .filter(|l| contains_ci(&l.text, &profile.faculty_token))
        .map(|l| l.text.trim().to_string())
        .collect();

    Heading {
        title,
        degree_type,
        faculties,
    }
}
