//! Rule-based Greek lemma guesses.
//!
//! A fallback for surface forms the precomputed lemma map does not know.
//! The generator strips common noun and verb endings, removes the past-tense
//! augment and expands vowel contractions, then lets the caller decide which
//! guesses are real lemmas via an existence predicate. It never consults the
//! lemma map and its answers are never merged into map-derived results; a
//! caller has to ask for them explicitly.
//!
//! # How it works
//! 1. Normalize the word with the shared corpus normalizer.
//! 2. Emit the normalized form itself (`Surface`).
//! 3. Strip noun endings, re-attaching the usual nominative (`NounEnding`).
//! 4. Strip verb endings, re-attaching `-ω` and `-ειν`; drop a leading
//!    augment `ε-` from long stems (`VerbEnding`, `Augment`).
//! 5. Expand contracted vowel pairs (`Contraction`).
//! 6. Deduplicate, keeping the first provenance seen.
//!
//! # Example
//! ```no_run
//! use classics_db::{DictionaryStore, Store};
//! use classics_morphy::GreekLemmatizer;
//! use classics_types::Language;
//!
//! # fn main() -> anyhow::Result<()> {
//! let store = Store::open("/path/to/perseus_texts.db")?;
//! let exists = |lemma: &str| matches!(store.entry(lemma, Language::Greek), Ok(Some(_)));
//!
//! for cand in GreekLemmatizer.lemmas_for("λόγου", exists) {
//!     println!("{:?}: {}", cand.source, cand.lemma);
//! }
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p classics-morphy --example candidates -- [<db>] <word>...`.

use std::collections::HashSet;

use classics_types::{Language, normalize};

/// Where a candidate lemma originated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CandidateSource {
    Surface,
    NounEnding {
        ending: &'static str,
    },
    VerbEnding {
        ending: &'static str,
    },
    /// Augment removed from a stem left by stripping `ending`.
    Augment {
        ending: &'static str,
    },
    Contraction {
        contracted: &'static str,
        expansion: &'static str,
    },
}

/// A lemma guess (normalized) paired with its provenance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LemmaCandidate {
    pub lemma: String,
    pub source: CandidateSource,
}

// Endings are written in normalized form: no accents, no iota subscript,
// medial sigma only. Repeats within and across tables are intentional;
// they fall out at deduplication.
const SECOND_DECLENSION: &[&str] = &["οσ", "ου", "ω", "ον", "ε", "οι", "ων", "οισ", "ουσ", "οιν"];
const FIRST_DECLENSION: &[&str] = &["α", "ασ", "α", "αν", "η", "ησ", "η", "ην", "αι", "ων", "αισ", "ασ"];
const THIRD_DECLENSION: &[&str] = &["σ", "οσ", "ι", "α", "ε", "εσ", "ων", "σι", "ασ", "α"];

const PRESENT: &[&str] = &[
    "ω", "εισ", "ει", "ομεν", "ετε", "ουσι", "ομαι", "η", "εται", "ομεθα", "εσθε", "ονται",
];
const AORIST: &[&str] = &["α", "ασ", "ε", "αμεν", "ατε", "αν", "ον", "εσ", "ε", "ομεν", "ετε", "ον"];
const CONTRACT: &[&str] = &[
    "ω", "εισ", "ει", "ουμεν", "ειτε", "ουσι", "ω", "ασ", "α", "ωμεν", "ατε", "ωσι",
];

const CONTRACTIONS: &[(&str, &[&str])] = &[
    ("ου", &["εου", "οου"]),
    ("ω", &["εω", "αω"]),
    ("ει", &["εει"]),
    ("οι", &["εοι", "οοι"]),
];

/// Stateless Greek candidate generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreekLemmatizer;

impl GreekLemmatizer {
    /// Every guess for `word`, most plausible first, with provenance.
    ///
    /// A blank word (or one with no Greek letters) yields no candidates.
    pub fn candidates(&self, word: &str) -> Vec<LemmaCandidate> {
        let word = normalize(word, Language::Greek);
        if word.is_empty() {
            return Vec::new();
        }

        let mut out = Candidates::default();
        out.push(word.clone(), CandidateSource::Surface);
        noun_candidates(&word, &mut out);
        verb_candidates(&word, &mut out);
        contraction_candidates(&word, &mut out);
        out.items
    }

    /// Candidates that pass `lemma_exists`, in generation order.
    ///
    /// The predicate receives normalized keys, which is what
    /// `dictionary_entries.headword_normalized` stores.
    pub fn lemmas_for<F>(&self, word: &str, lemma_exists: F) -> Vec<LemmaCandidate>
    where
        F: Fn(&str) -> bool,
    {
        self.candidates(word)
            .into_iter()
            .filter(|cand| lemma_exists(&cand.lemma))
            .collect()
    }
}

/// Lemma guesses for `word` as plain strings.
pub fn generate_candidates(word: &str) -> Vec<String> {
    GreekLemmatizer
        .candidates(word)
        .into_iter()
        .map(|cand| cand.lemma)
        .collect()
}

#[derive(Default)]
struct Candidates {
    seen: HashSet<String>,
    items: Vec<LemmaCandidate>,
}

impl Candidates {
    fn push(&mut self, lemma: String, source: CandidateSource) {
        if self.seen.insert(lemma.clone()) {
            self.items.push(LemmaCandidate { lemma, source });
        }
    }
}

/// Stem left after removing `ending`, if the word is long enough to keep
/// at least three letters of it.
fn strip<'a>(word: &'a str, ending: &str) -> Option<&'a str> {
    let stem = word.strip_suffix(ending)?;
    (word.chars().count() > ending.chars().count() + 2).then_some(stem)
}

fn noun_candidates(word: &str, out: &mut Candidates) {
    let endings = SECOND_DECLENSION
        .iter()
        .chain(FIRST_DECLENSION)
        .chain(THIRD_DECLENSION);
    for &ending in endings {
        let Some(stem) = strip(word, ending) else {
            continue;
        };
        let source = CandidateSource::NounEnding { ending };
        out.push(stem.to_string(), source.clone());
        if SECOND_DECLENSION.contains(&ending) && !ending.ends_with("οσ") {
            out.push(format!("{stem}οσ"), source.clone());
        }
        if FIRST_DECLENSION.contains(&ending) {
            if !ending.ends_with('α') {
                out.push(format!("{stem}α"), source.clone());
            }
            if !ending.ends_with('η') {
                out.push(format!("{stem}η"), source);
            }
        }
    }
}

fn verb_candidates(word: &str, out: &mut Candidates) {
    for &ending in PRESENT.iter().chain(AORIST).chain(CONTRACT) {
        let Some(stem) = strip(word, ending) else {
            continue;
        };
        let source = CandidateSource::VerbEnding { ending };
        out.push(stem.to_string(), source.clone());
        out.push(format!("{stem}ω"), source.clone());
        out.push(format!("{stem}ειν"), source);

        if stem.chars().count() > 3
            && let Some(bare) = stem.strip_prefix('ε')
        {
            let source = CandidateSource::Augment { ending };
            out.push(bare.to_string(), source.clone());
            out.push(format!("{bare}ω"), source);
        }
    }
}

fn contraction_candidates(word: &str, out: &mut Candidates) {
    for &(contracted, expansions) in CONTRACTIONS {
        if !word.contains(contracted) {
            continue;
        }
        for &expansion in expansions {
            out.push(
                word.replace(contracted, expansion),
                CandidateSource::Contraction {
                    contracted,
                    expansion,
                },
            );
        }
    }
}
