//! Relative-name type detection.
//!
//! The relative-name box usually carries a labelled value — "वडिलांचे नाव:
//! <name>" (father's name), "पतीचे नाव: <name>" (husband's), and so on. The
//! label classifies the relationship and must be removed from the value no
//! matter where OCR left it: before the separator, after it, or duplicated
//! mid-string.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Relationship of the relative named in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeType {
    Father,
    Husband,
    Mother,
    Other,
}

impl RelativeType {
    /// Single-letter code used in the output schema.
    pub fn code(self) -> &'static str {
        match self {
            RelativeType::Father => "F",
            RelativeType::Husband => "H",
            RelativeType::Mother => "M",
            RelativeType::Other => "O",
        }
    }
}

/// Label phrases and the relationship they announce.
const TYPE_LABELS: [(&str, RelativeType); 4] = [
    ("वडिलांचे नाव", RelativeType::Father),
    ("पतीचे नाव", RelativeType::Husband),
    ("आईचे नाव", RelativeType::Mother),
    ("इतर नाव", RelativeType::Other),
];

/// Classify a relative-name value and strip every label occurrence.
///
/// Returns the detected type code (empty string when no label was found)
/// and the cleaned name.
pub fn extract_relative_type(relative_name: &str) -> (String, String) {
    let trimmed = relative_name.trim();
    if trimmed.is_empty() {
        return (String::new(), String::new());
    }

    let mut detected = "";
    let mut cleaned = trimmed.to_string();

    // Detect from the part before a separator first, then from a leading
    // label with no separator at all.
    if let Some((prefix, value)) = trimmed.split_once(':') {
        for (label, ty) in TYPE_LABELS {
            if prefix.contains(label) {
                detected = ty.code();
                cleaned = value.trim().to_string();
                break;
            }
        }
    }
    if detected.is_empty() {
        for (label, ty) in TYPE_LABELS {
            if let Some(rest) = trimmed.strip_prefix(label) {
                detected = ty.code();
                cleaned = rest.trim_start_matches([':', ' ', '-']).trim().to_string();
                break;
            }
        }
    }

    (detected.to_string(), strip_labels(&cleaned))
}

/// Remove every label phrase (with or without an adjoining colon) from
/// anywhere in the value and tidy the leftovers.
pub fn strip_labels(value: &str) -> String {
    let mut cleaned = value.to_string();
    for (label, _) in TYPE_LABELS {
        let with_colon_after = format!("{label}:");
        let with_colon_before = format!(":{label}");
        cleaned = cleaned.replace(&with_colon_after, "");
        cleaned = cleaned.replace(&with_colon_before, "");
        cleaned = cleaned.replace(label, "");
    }

    let cleaned = RE_WHITESPACE.replace_all(cleaned.trim(), " ");
    cleaned.trim_matches([':', '-', ' ']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_before_separator_sets_type() {
        let (code, name) = extract_relative_type("वडिलांचे नाव: रमेश पाटील");
        assert_eq!(code, "F");
        assert_eq!(name, "रमेश पाटील");
    }

    #[test]
    fn label_without_separator_sets_type() {
        let (code, name) = extract_relative_type("पतीचे नाव सुरेश जाधव");
        assert_eq!(code, "H");
        assert_eq!(name, "सुरेश जाधव");
    }

    #[test]
    fn mother_and_other_labels() {
        assert_eq!(extract_relative_type("आईचे नाव: सीता").0, "M");
        assert_eq!(extract_relative_type("इतर नाव: कोणी").0, "O");
    }

    #[test]
    fn no_label_means_no_type() {
        let (code, name) = extract_relative_type("रमेश पाटील");
        assert_eq!(code, "");
        assert_eq!(name, "रमेश पाटील");
    }

    #[test]
    fn label_after_value_is_still_stripped() {
        let (_, name) = extract_relative_type("रमेश पाटील वडिलांचे नाव");
        assert_eq!(name, "रमेश पाटील");
    }

    #[test]
    fn empty_input() {
        assert_eq!(extract_relative_type(""), (String::new(), String::new()));
        assert_eq!(extract_relative_type("   "), (String::new(), String::new()));
    }

    #[test]
    fn strip_labels_removes_every_occurrence() {
        assert_eq!(strip_labels("वडिलांचे नाव: राम वडिलांचे नाव"), "राम");
        assert_eq!(strip_labels(": - राम -"), "राम");
    }
}
