//! Voter-ID (EPIC) correction and validation.
//!
//! An EPIC number is exactly 10 characters: 3 uppercase letters followed by
//! 7 digits. OCR confuses visually similar glyphs in both directions, so
//! correction is positional — digits that landed in the letter positions
//! become the letters they resemble (`1→I`, `0→O`), letters in the digit
//! positions become digits (`O→0`, `I→1`). Correction is idempotent: once a
//! character has been mapped it is outside the substitution domain.

use once_cell::sync::Lazy;
use regex::Regex;

/// Values an ID field resolves to when the cell is blank or unreadable.
/// Resolving to one of these is a skip, not an error.
pub const SENTINEL_IDS: [&str; 6] = ["NO ID", "NOID", "N/A", "NA", "NOT FOUND", "NONE"];

static RE_STRICT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}[0-9]{7}$").unwrap());
static RE_EPIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]{3}[0-9]{7}").unwrap());
static RE_TEN_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z0-9]{10}").unwrap());

/// Strict format check: 3 uppercase letters + 7 digits, nothing else.
pub fn validate_voter_id(voter_id: &str) -> bool {
    RE_STRICT.is_match(voter_id)
}

/// True when the resolved ID is empty or one of the blank-cell sentinels.
pub fn is_sentinel(voter_id: &str) -> bool {
    let upper = voter_id.trim().to_uppercase();
    upper.is_empty() || SENTINEL_IDS.contains(&upper.as_str())
}

/// Search raw text for an EPIC-shaped substring.
pub fn find_epic_pattern(text: &str) -> Option<String> {
    RE_EPIC.find(&text.to_uppercase()).map(|m| m.as_str().to_string())
}

/// Fix common OCR confusions in a voter ID.
///
/// Whitespace and trailing underscores are stripped first; if a strict
/// EPIC substring already exists it wins outright. Otherwise a 10-character
/// alphanumeric run is corrected positionally. Anything else is returned
/// cleaned but untouched — the caller's validation decides its fate.
pub fn correct_voter_id(voter_id: &str) -> String {
    let cleaned: String = voter_id
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    let cleaned = cleaned.trim_end_matches('_').trim().to_string();
    if cleaned.is_empty() {
        return cleaned;
    }

    if let Some(m) = RE_EPIC.find(&cleaned) {
        let candidate = m.as_str().to_string();
        if validate_voter_id(&candidate) {
            return candidate;
        }
    }

    let target = if cleaned.len() != 10 {
        match RE_TEN_ALNUM.find(&cleaned) {
            Some(m) => m.as_str().to_string(),
            None => return cleaned,
        }
    } else {
        cleaned
    };

    let mut corrected: Vec<char> = target.chars().collect();
    for (i, c) in corrected.iter_mut().enumerate() {
        if i < 3 {
            *c = match *c {
                '1' => 'I',
                '0' => 'O',
                '5' => 'S',
                '8' => 'B',
                other => other,
            };
        } else {
            *c = match *c {
                'O' => '0',
                'I' => '1',
                'S' => '5',
                'Z' => '2',
                'L' => '1',
                other => other,
            };
        }
    }

    corrected.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_accepts_strict_format_only() {
        assert!(validate_voter_id("ABC1234567"));
        assert!(!validate_voter_id("AB1234567")); // wrong letter count
        assert!(!validate_voter_id("abc1234567")); // lowercase
        assert!(!validate_voter_id("ABCD123456"));
        assert!(!validate_voter_id(""));
        assert!(!validate_voter_id("ABC1234567X")); // trailing junk
    }

    #[test]
    fn positional_corrections() {
        assert_eq!(correct_voter_id("ABC1234567"), "ABC1234567");
        assert_eq!(correct_voter_id("1BC1234567"), "IBC1234567");
        assert_eq!(correct_voter_id("ABC12345O7"), "ABC1234507");
        assert_eq!(correct_voter_id("abc123456o"), "ABC1234560");
        assert_eq!(correct_voter_id("1BCO123456"), "IBC0123456");
        assert_eq!(correct_voter_id("ABC12345SO"), "ABC1234550");
    }

    #[test]
    fn cleanup_before_correction() {
        assert_eq!(correct_voter_id(" ABC 1234567_"), "ABC1234567");
        assert_eq!(correct_voter_id("ABC\n1234567"), "ABC1234567");
    }

    #[test]
    fn embedded_pattern_is_extracted() {
        assert_eq!(correct_voter_id("ID: ABC1234567 (verified)"), "ABC1234567");
        assert_eq!(find_epic_pattern("xx abc1234567 yy").as_deref(), Some("ABC1234567"));
        assert!(find_epic_pattern("nothing here").is_none());
    }

    #[test]
    fn correction_is_idempotent_on_ten_char_alnum() {
        let inputs = [
            "ABC1234567",
            "1BC1234567",
            "ABC12345SO",
            "0OC1IL23S4",
            "QQQ9999999",
            "A1B2C3D4E5",
            "ZZZZZZZZZZ",
            "1234567890",
        ];
        for input in inputs {
            let once = correct_voter_id(input);
            let twice = correct_voter_id(&once);
            assert_eq!(once, twice, "not idempotent for {input}");
        }
    }

    #[test]
    fn sentinels_are_recognised() {
        for s in SENTINEL_IDS {
            assert!(is_sentinel(s), "{s}");
        }
        assert!(is_sentinel("n/a"));
        assert!(is_sentinel("  "));
        assert!(!is_sentinel("ABC1234567"));
    }
}
