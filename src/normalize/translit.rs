//! Devanagari → Latin transliteration.
//!
//! Names are transliterated through the injected [`Transliterator`] provider
//! when one is configured; its output is only accepted when it actually left
//! the Devanagari script. Everything else falls back to the deterministic
//! local mapping below — vowel, consonant and matra tables with inherent-
//! vowel handling — so the English columns are never empty just because an
//! external service was down.

use crate::providers::Transliterator;

/// Independent vowels, consonants and numerals.
fn base_sound(c: char) -> Option<&'static str> {
    Some(match c {
        // Vowels
        'अ' => "a",
        'आ' => "aa",
        'इ' => "i",
        'ई' => "ee",
        'उ' => "u",
        'ऊ' => "oo",
        'ऋ' => "ri",
        'ए' => "e",
        'ऐ' => "ai",
        'ओ' => "o",
        'औ' => "au",
        // Consonants
        'क' => "k",
        'ख' => "kh",
        'ग' => "g",
        'घ' => "gh",
        'ङ' => "ng",
        'च' => "ch",
        'छ' => "chh",
        'ज' => "j",
        'झ' => "jh",
        'ञ' => "ny",
        'ट' => "t",
        'ठ' => "th",
        'ड' => "d",
        'ढ' => "dh",
        'ण' => "n",
        'त' => "t",
        'थ' => "th",
        'द' => "d",
        'ध' => "dh",
        'न' => "n",
        'प' => "p",
        'फ' => "ph",
        'ब' => "b",
        'भ' => "bh",
        'म' => "m",
        'य' => "y",
        'र' => "r",
        'ल' => "l",
        'व' => "v",
        'श' => "sh",
        'ष' => "sh",
        'स' => "s",
        'ह' => "h",
        'ळ' => "l",
        // Numerals
        '०' => "0",
        '१' => "1",
        '२' => "2",
        '३' => "3",
        '४' => "4",
        '५' => "5",
        '६' => "6",
        '७' => "7",
        '८' => "8",
        '९' => "9",
        _ => return None,
    })
}

/// Dependent vowel signs (matras).
fn matra_sound(c: char) -> Option<&'static str> {
    Some(match c {
        'ा' => "aa",
        'ि' => "i",
        'ी' => "ee",
        'ु' => "u",
        'ू' => "oo",
        'ृ' => "ri",
        'े' => "e",
        'ै' => "ai",
        'ो' => "o",
        'ौ' => "au",
        _ => return None,
    })
}

fn is_consonant(c: char) -> bool {
    ('क'..='ह').contains(&c) || c == 'ळ'
}

/// Anusvara nasalises as `m` before labials, `n` elsewhere.
fn anusvara_sound(next: Option<char>) -> &'static str {
    match next {
        Some('प' | 'फ' | 'ब' | 'भ' | 'म') => "m",
        _ => "n",
    }
}

/// Deterministic local transliteration.
///
/// Consonants carry an inherent `a` unless followed by a matra, a halant
/// (conjunct), or a word boundary. Already-Latin text is only re-capitalised.
pub fn transliterate_to_latin(text: &str) -> String {
    if !crate::normalize::devanagari::contains_devanagari(text) {
        return capitalize_words(text.trim());
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match c {
            ' ' => out.push(' '),
            '.' | ',' | '-' | ':' | ';' | '!' | '?' => out.push(c),
            'ं' => out.push_str(anusvara_sound(next)),
            'ः' => out.push('h'),
            // Halant kills the inherent vowel; the previous consonant was
            // emitted without one, so nothing to do.
            '्' => {}
            _ => {
                if let Some(base) = base_sound(c) {
                    out.push_str(base);
                    if is_consonant(c) {
                        match next {
                            Some(m) if matra_sound(m).is_some() => {
                                out.push_str(matra_sound(m).unwrap());
                                i += 1;
                            }
                            // Conjunct or word boundary: no inherent vowel.
                            // Anusvara/visarga still nasalise a live vowel,
                            // so they do not count as a boundary here.
                            Some('्') => {}
                            Some(n)
                                if (n == ' ' || !n.is_alphanumeric())
                                    && n != 'ं'
                                    && n != 'ः' => {}
                            None => {}
                            _ => out.push('a'),
                        }
                    }
                } else {
                    out.push(c);
                }
            }
        }
        i += 1;
    }

    let collapsed = out.split_whitespace().collect::<Vec<_>>().join(" ");
    capitalize_words(&collapsed)
}

/// First letter upper, rest lower, per word.
pub fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut cs = word.chars();
            match cs.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &cs.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Transliterate a name: injected provider first, local mapping on any
/// failure or when the provider's output still contains Devanagari.
pub fn transliterate_name(name: &str, provider: Option<&dyn Transliterator>) -> String {
    let cleaned = name.trim();
    if cleaned.is_empty() {
        return String::new();
    }

    if let Some(provider) = provider {
        if let Ok(result) = provider.transliterate(cleaned) {
            let result = result.trim();
            if !result.is_empty()
                && !crate::normalize::devanagari::contains_devanagari(result)
                && result.chars().any(|c| c.is_ascii_alphabetic())
            {
                return capitalize_words(result);
            }
        }
    }

    transliterate_to_latin(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;

    #[test]
    fn simple_names() {
        assert_eq!(transliterate_to_latin("राम कुमार"), "Raam Kumaar");
        assert_eq!(transliterate_to_latin("सीता"), "Seetaa");
    }

    #[test]
    fn conjuncts_drop_the_inherent_vowel() {
        // क + ् + ष → "ksh"
        assert_eq!(transliterate_to_latin("क्ष"), "Ksh");
    }

    #[test]
    fn anusvara_depends_on_following_consonant() {
        assert_eq!(transliterate_to_latin("नंद"), "Nand");
        // Labial after anusvara → m.
        assert_eq!(transliterate_to_latin("संभव"), "Sambhav");
    }

    #[test]
    fn latin_input_is_only_capitalised() {
        assert_eq!(transliterate_to_latin("john smith"), "John Smith");
        assert_eq!(capitalize_words("MIXED case WORDS"), "Mixed Case Words");
    }

    struct FixedTranslit(&'static str);
    impl Transliterator for FixedTranslit {
        fn transliterate(&self, _text: &str) -> Result<String, ProviderError> {
            if self.0.is_empty() {
                Err(ProviderError::Api("down".into()))
            } else {
                Ok(self.0.to_string())
            }
        }
    }

    #[test]
    fn provider_result_wins_when_usable() {
        let provider = FixedTranslit("ram kumar");
        assert_eq!(
            transliterate_name("राम कुमार", Some(&provider)),
            "Ram Kumar"
        );
    }

    #[test]
    fn provider_failure_falls_back_to_local_mapping() {
        let provider = FixedTranslit("");
        assert_eq!(
            transliterate_name("राम कुमार", Some(&provider)),
            "Raam Kumaar"
        );
        assert_eq!(transliterate_name("राम कुमार", None), "Raam Kumaar");
    }

    #[test]
    fn provider_output_still_in_devanagari_is_rejected() {
        let provider = FixedTranslit("राम");
        assert_eq!(
            transliterate_name("राम कुमार", Some(&provider)),
            "Raam Kumaar"
        );
    }
}
