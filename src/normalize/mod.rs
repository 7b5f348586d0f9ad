//! Text normalization and validation.
//!
//! Raw field text goes through a fixed per-field order after extraction and
//! before a record is finalised:
//!
//! 1. [`devanagari`] — script-specific OCR-error correction (word table +
//!    iterative pattern cascade) and structured-field cleanup
//! 2. [`relative`]   — relative-name type detection and label stripping
//! 3. [`voter_id`]   — EPIC correction, strict validation, sentinel handling
//! 4. [`translit`]   — Latin-script rendering of names (provider first,
//!    deterministic local mapping as fallback)
//!
//! Every stage is best-effort: on anything it cannot handle it returns its
//! input unchanged, so a normalization hiccup never aborts a record.

pub mod devanagari;
pub mod relative;
pub mod translit;
pub mod voter_id;

use once_cell::sync::Lazy;
use regex::Regex;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    RE_WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Scrub relative-name label phrases that OCR bled into the *name* field.
pub fn clean_name_from_relative_labels(name: &str) -> String {
    relative::strip_labels(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_collapse() {
        assert_eq!(collapse_whitespace("  a\n b\t\tc "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn name_field_loses_relative_labels() {
        assert_eq!(
            clean_name_from_relative_labels("राम वडिलांचे नाव:"),
            "राम"
        );
    }
}
