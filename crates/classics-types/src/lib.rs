//! Shared types for Greek/Latin dictionary lookup over a prebuilt corpus.
//!
//! The records mirror the rows of the corpus database (`lemma_map`,
//! `dictionary_entries`, `words`, `text_lines`) plus the query-scoped
//! results built from them. Everything here is plain owned data; nothing is
//! cached or shared between lookups.
//!
//! Use [`normalize`] to turn a surface token into the key every table is
//! indexed by, [`Language`] to pick the normalization rules and dictionary,
//! and [`ResolvedEntry`] / [`OccurrenceRecord`] to inspect query results.
//!
//! ```rust
//! use classics_types::{Language, normalize};
//!
//! assert_eq!(normalize("λόγος,", Language::Greek), "λογοσ");
//! assert_eq!(normalize("Amor!", Language::Latin), "amor");
//! ```

mod normalize;

use std::fmt;

pub use normalize::{is_punctuation, normalize};

/// Corpus language; selects normalization rules and the dictionary to search.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Language {
    Greek,
    Latin,
}

impl Language {
    /// Parse a language label such as `"greek"` or `" Latin "`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "greek" | "grc" => Some(Language::Greek),
            "latin" | "lat" | "la" => Some(Language::Latin),
            _ => None,
        }
    }

    /// Label stored in the `language` column of `dictionary_entries`.
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Greek => "greek",
            Language::Latin => "latin",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `lemma_map` row: a normalized surface form pointing at a candidate lemma.
#[derive(Clone, Debug, PartialEq)]
pub struct LemmaMapEntry {
    pub word_form: String,
    pub word_normalized: String,
    pub lemma: String,
    pub confidence: Option<f64>,
    pub morph_info: Option<String>,
    pub source: Option<String>,
}

/// One `dictionary_entries` row.
#[derive(Clone, Debug, PartialEq)]
pub struct DictionaryEntry {
    pub headword: String,
    pub headword_normalized: String,
    pub language: Language,
    pub entry_html: Option<String>,
    pub entry_plain: Option<String>,
}

impl DictionaryEntry {
    /// Rendered definition: HTML when present, then plain text, else empty.
    pub fn definition(&self) -> &str {
        self.entry_html
            .as_deref()
            .or(self.entry_plain.as_deref())
            .unwrap_or("")
    }
}

/// How a resolved entry was reached.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchOrigin {
    /// The normalized word itself is a dictionary headword.
    Direct,
    /// Reached through a `lemma_map` row.
    LemmaMap {
        confidence: Option<f64>,
        morph_info: Option<String>,
    },
}

/// A dictionary entry reachable from a surface word, as ranked by the resolver.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEntry {
    pub lemma: String,
    pub definition: String,
    pub origin: MatchOrigin,
}

impl ResolvedEntry {
    pub fn is_direct_match(&self) -> bool {
        matches!(self.origin, MatchOrigin::Direct)
    }

    /// Raw mapping confidence; `None` for direct matches and unscored rows.
    pub fn confidence(&self) -> Option<f64> {
        match &self.origin {
            MatchOrigin::Direct => None,
            MatchOrigin::LemmaMap { confidence, .. } => *confidence,
        }
    }

    pub fn morph_info(&self) -> Option<&str> {
        match &self.origin {
            MatchOrigin::Direct => None,
            MatchOrigin::LemmaMap { morph_info, .. } => morph_info.as_deref(),
        }
    }
}

/// A single word of a corpus line that matched an occurrence query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WordMatch {
    pub word: String,
    pub position: u32,
}

/// Storage-level occurrence hit: one matched word together with its line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OccurrenceRow {
    pub book_id: String,
    pub line_number: u32,
    pub line_text: String,
    pub word: String,
    pub position: u32,
}

/// One corpus line containing at least one form of the queried lemma.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OccurrenceRecord {
    pub book_id: String,
    pub line_number: u32,
    pub line_text: String,
    pub matches: Vec<WordMatch>,
}
