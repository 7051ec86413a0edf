//! Helper functions for text processing and serialization.

use regex::{Regex, RegexBuilder};

/// Build a case-insensitive, whole-word matcher for a literal string.
pub fn whole_word_matcher(literal: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(literal)))
        .case_insensitive(true)
        .build()
}

/// Re-case `replacement` to follow the casing of `matched`.
///
/// - `SAM` -> `JORDAN`
/// - `Sam` -> `Jordan`
/// - `sam` (or anything else) -> `jordan`
pub fn apply_case_pattern(matched: &str, replacement: &str) -> String {
    if matched == matched.to_uppercase() {
        return replacement.to_uppercase();
    }

    let first_is_upper = matched.chars().next().map_or(false, char::is_uppercase);
    if first_is_upper {
        capitalize(replacement)
    } else {
        replacement.to_lowercase()
    }
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
