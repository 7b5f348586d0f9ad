//! Devanagari text correction and field cleanup.
//!
//! Scanned rolls come back from OCR with systematic glyph confusions:
//! matras (vowel signs) read as consonants, conjuncts split apart,
//! similar-looking characters swapped. The corrector is a rule table, not a
//! linguistic model — a word-level substitution map for whole misreadings,
//! then an iterative cascade of pattern rules (capped at 5 passes or a fixed
//! point). The table is replaceable: rules encode observed OCR error shapes,
//! and the only contract is noisy string in, corrected string out,
//! idempotent once converged, never a panic.
//!
//! The per-field cleaners at the bottom normalise the structured fields
//! (age, gender, house/assembly/serial numbers) into their canonical shapes.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_DEVANAGARI: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\u{0900}-\u{097F}]").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// True when the text contains any character from the Devanagari block.
pub fn contains_devanagari(text: &str) -> bool {
    RE_DEVANAGARI.is_match(text)
}

// ── Correction tables ────────────────────────────────────────────────────────

/// Whole-word misreadings, applied longest-first so specific phrases win
/// over their fragments.
static WORD_FIXES: &[(&str, &str)] = &[
    ("शडख अलदम शखह मखहमोद", "शेख अलीम शाह मोहम्मद"),
    ("कनहजयभलभल", "कन्हैयालाल"),
    ("नसदकममभर", "नंदकुमार"),
    ("कनहजयभल", "कन्हैयालाल"),
    ("आसबवरच", "आंबवणे"),
    ("मखहमोद", "मोहम्मद"),
    ("जगददश", "जगदीश"),
    ("ममडनष", "मोनिष"),
    ("जगदश", "जगदीश"),
    ("जरशद", "जोशी"),
    ("अलदम", "अलीम"),
    ("शडख", "शेख"),
    ("शखह", "शाह"),
];

/// Pattern rules, most specific first. Each rule captures its right-hand
/// boundary (consonant, matra, whitespace or end of input) and re-emits it;
/// the iterative cascade resolves overlaps the single pass cannot.
static PATTERN_FIXES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"मखहमोद", "मोहमोद"),
        (r"मोहमोद", "मोहम्मद"),
        (r"दकममभर([क-ह]|\s|$)", "दकुमार${1}"),
        (r"कममभर([क-ह]|\s|$)", "कुमार${1}"),
        (r"([क-ह])ममभर([क-ह]|\s|$)", "${1}मार${2}"),
        (r"([क-ह])रशद([क-हा-ौंः]|\s|$)", "${1}ोशी${2}"),
        (r"([क-ह])ददश([क-हा-ौंः]|\s|$)", "${1}दीश${2}"),
        (r"([क-ह])भलभल([क-ह]|\s|$)", "${1}लाल${2}"),
        (r"([क-ह])लभल([क-ह]|\s|$)", "${1}लाल${2}"),
        (r"([क-ह])नहज([क-हा-ौंः]|\s|$)", "${1}न्है${2}"),
        (r"([क-ह])डख([क-हा-ौंः]|\s|$)", "${1}ेख${2}"),
        (r"([क-ह])खह([क-हा-ौंः]|\s|$)", "${1}ाह${2}"),
        (r"([क-ह])दम([क-ह]|\s|$)", "${1}ीम${2}"),
        (r"रच([क-ह]|\s|$)", "णे${1}"),
        (r"डनष([क-ह]|\s|$)", "निष${1}"),
        (r"डन([क-हा-ौंः]|\s|$)", "नि${1}"),
        (r"मम([क-हा-ौंः]|\s|$)", "मो${1}"),
        (r"([क-ह])दद([क-हा-ौंः]|\s|$)", "${1}दी${2}"),
        (r"([क-ह])दश([क-ह]|\s|$)", "${1}दीश${2}"),
        (r"([क-ह])रश([क-हा-ौंः]|\s|$)", "${1}ोश${2}"),
        (r"([क-ह])शद([क-हा-ौंः]|\s|$)", "${1}शी${2}"),
        (r"([क-ह])यभ([क-हा-ौंः]|\s|$)", "${1}या${2}"),
        (r"([क-ह])लभ([क-हा-ौंः]|\s|$)", "${1}ला${2}"),
        (r"([क-ह])स([क-हा-ौंः]|\s|$)", "${1}ं${2}"),
        (r"([क-ह])भल(\s|$)", "${1}ल${2}"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
    .collect()
});

/// Maximum cascade passes before giving up on a fixed point.
const MAX_CORRECTION_PASSES: usize = 5;

/// Correct OCR misreadings in Devanagari text.
///
/// Non-Devanagari input passes through unchanged.
pub fn correct_text(text: &str) -> String {
    if !contains_devanagari(text) {
        return text.to_string();
    }

    let mut corrected = text.to_string();

    for (wrong, right) in WORD_FIXES {
        if corrected.contains(wrong) {
            corrected = corrected.replace(wrong, right);
        }
    }

    for _ in 0..MAX_CORRECTION_PASSES {
        let previous = corrected.clone();
        for (regex, replacement) in PATTERN_FIXES.iter() {
            corrected = regex.replace_all(&corrected, *replacement).into_owned();
        }
        if corrected == previous {
            break;
        }
    }

    corrected
}

// ── Name cleaning ────────────────────────────────────────────────────────────

static RE_NON_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\u{0900}-\u{097F}\s.]").unwrap());
static RE_DEVANAGARI_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{0905}-\u{0939}\u{0958}-\u{0963}]").unwrap());

/// Keep only Devanagari characters, spaces and abbreviation periods.
///
/// Returns an empty string when nothing name-like remains (no independent
/// vowel or consonant survives the filter).
pub fn clean_name(name: &str) -> String {
    let collapsed = RE_WHITESPACE.replace_all(name.trim(), " ");
    let filtered = RE_NON_NAME_CHARS.replace_all(&collapsed, "");
    let cleaned = RE_WHITESPACE
        .replace_all(filtered.trim(), " ")
        .trim_matches([' ', '.'])
        .to_string();

    if RE_DEVANAGARI_LETTER.is_match(&cleaned) {
        cleaned
    } else {
        String::new()
    }
}

/// Full name correction: strip invalid characters, run the OCR-error
/// cascade, strip again in case corrections exposed stray marks.
pub fn correct_name(name: &str) -> String {
    let cleaned = clean_name(name);
    if cleaned.is_empty() {
        return cleaned;
    }
    clean_name(&correct_text(&cleaned))
}

// ── Structured-field cleaners ────────────────────────────────────────────────

static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static RE_WARD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bward\b|वार्ड").unwrap());
static RE_NON_ASSEMBLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d/\s]").unwrap());
static RE_SLASH_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*/\s*").unwrap());

/// Age is a bare number: return the first digit run, or nothing.
pub fn clean_age_field(age: &str) -> String {
    RE_NUMBER
        .find(age)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Stray characters OCR sprinkles around house numbers.
const HOUSE_JUNK: [char; 7] = ['ह', 'द', 'इ', 'प', 'ज', '-', '*'];

static RE_HOUSE_JUNK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[हदइपज]+").unwrap());

/// Strip the junk blacklist from both ends of a house number and collapse
/// internal whitespace. Internal separators between digits survive.
pub fn clean_house_number_field(house: &str) -> String {
    let mut cleaned = house.replace(':', "");
    cleaned = RE_HOUSE_JUNK_RUN.replace_all(&cleaned, "").into_owned();
    cleaned = RE_WHITESPACE.replace_all(cleaned.trim(), " ").into_owned();

    let cleaned = cleaned
        .trim_matches(|c: char| HOUSE_JUNK.contains(&c) || c.is_whitespace())
        .to_string();
    RE_WHITESPACE.replace_all(&cleaned, " ").into_owned()
}

static RE_GENDER_MALE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^प[ुूह]").unwrap());
static RE_GENDER_FEMALE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"स्त्री|स्तर[ीि]|स्र[ीि]|^सद|सद[ीि]").unwrap());
static RE_GENDER_OTHER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^इत|^other$").unwrap());

/// Normalise gender to one of the three canonical codes (पु / स्री / इतर).
///
/// Direct lookup first, regex patterns second; anything unrecognised passes
/// through unchanged so a reviewer can spot it downstream.
pub fn correct_gender_field(gender: &str) -> String {
    let g = gender.trim();
    if g.is_empty() {
        return String::new();
    }

    let direct = match g {
        "पु" | "पू" | "पह" | "पुः" | "पूः" | "पहः" => Some("पु"),
        "स्री" | "स्त्री" | "सद" | "स्त्रि" | "स्त्र" | "स्रि" | "स्तरी" | "स्त्रिी" | "सदी" | "सदि" => {
            Some("स्री")
        }
        "इतर" | "इत्तर" | "इत" | "इतर्" => Some("इतर"),
        _ => None,
    };
    if let Some(code) = direct {
        return code.to_string();
    }

    if RE_GENDER_MALE.is_match(g) {
        return "पु".to_string();
    }
    if RE_GENDER_FEMALE.is_match(g) {
        return "स्री".to_string();
    }
    if RE_GENDER_OTHER.is_match(g) {
        return "इतर".to_string();
    }

    g.to_string()
}

/// Assembly numbers keep their `/` separators (`36/247/4`); everything
/// else non-digit — including "ward" labels in either script — is dropped.
pub fn clean_assembly_number_field(assembly: &str) -> String {
    let cleaned = RE_WARD.replace_all(assembly, "");
    let cleaned = RE_NON_ASSEMBLY.replace_all(&cleaned, "");
    let cleaned = RE_SLASH_SPACING.replace_all(cleaned.trim(), "/");

    if RE_NUMBER.is_match(&cleaned) {
        RE_WHITESPACE.replace_all(&cleaned, "").into_owned()
    } else {
        String::new()
    }
}

/// Serial numbers are digits only: drop "ward" labels, join digit runs.
pub fn clean_serial_number_field(serial: &str) -> String {
    let cleaned = RE_WARD.replace_all(serial, "");
    let digits: String = RE_NUMBER
        .find_iter(&cleaned)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .concat();
    digits
}
