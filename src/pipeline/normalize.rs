//! Text normalisation shared by the matching stages.
//!
//! Matching rules differ per stage:
//!
//! | Helper | Used by | Effect |
//! |--------|---------|--------|
//! | [`contains_ci`] | heading classifier | lowercase substring test, nothing else |
//! | [`fold`] | year headers, catalog queries | NFKD, drop combining marks, lowercase, collapse whitespace |
//! | [`is_invisible`] | glyph decoding | zero-width and soft-hyphen characters never become glyphs |

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Case-insensitive substring containment. No stemming, no accent folding.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Fold text for accent- and case-insensitive comparison.
///
/// `"PRIMER   CURSO"`, `"Primer Curso"` and `"prímer curso"` all fold to
/// `"primer curso"`.
pub fn fold(text: &str) -> String {
    let stripped: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Characters that occupy a text position but render nothing.
pub fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{FEFF}' | '\u{00AD}' | '\u{200C}' | '\u{200D}' | '\u{2060}'
    )
}
