use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::Language;

const GREEK_BASIC: std::ops::RangeInclusive<char> = '\u{0370}'..='\u{03FF}';
const GREEK_EXTENDED: std::ops::RangeInclusive<char> = '\u{1F00}'..='\u{1FFF}';

/// Punctuation removed from either end of a token before lookup.
pub fn is_punctuation(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '.' | ','
                | ';'
                | ':'
                | '!'
                | '?'
                | '·'
                | '\u{0387}' // ano teleia
                | '\u{037E}' // greek question mark
                | '\''
                | '"'
                | '('
                | ')'
                | '['
                | ']'
                | '{'
                | '}'
                | '<'
                | '>'
                | '«'
                | '»'
                | '‘'
                | '’'
                | '“'
                | '”'
                | 'ʼ'
                | '-'
                | '–'
                | '—'
        )
}

/// Map a raw token to the key used by every corpus table.
///
/// Strips surrounding punctuation, decomposes to NFD, drops combining marks
/// and lowercases. Greek additionally folds final sigma and keeps only
/// letters from the Greek and Greek Extended blocks, so elision marks vanish
/// (elided forms live in the lemma map under their own key).
///
/// Total and idempotent: `normalize(&normalize(t, l), l) == normalize(t, l)`.
pub fn normalize(token: &str, language: Language) -> String {
    let trimmed = token.trim_matches(is_punctuation);
    let folded: String = trimmed
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        // Some lowercase mappings (e.g. `İ`) reintroduce a combining mark.
        .filter(|c| !is_combining_mark(*c))
        .collect();
    let folded = folded.trim_matches(is_punctuation);

    match language {
        Language::Latin => folded.to_string(),
        Language::Greek => folded
            .chars()
            .map(|c| if c == 'ς' { 'σ' } else { c })
            .filter(|c| c.is_alphabetic() && (GREEK_BASIC.contains(c) || GREEK_EXTENDED.contains(c)))
            .collect(),
    }
}
