//! Lemma resolution, dictionary-entry ranking and occurrence search.
//!
//! [`Lexicon`] ties the shared normalizer to a corpus store and answers two
//! questions for a reader tapping a word:
//!
//! 1. Which dictionary entries could this surface form belong to, and in
//!    what order should they be shown? ([`Lexicon::resolve_all`])
//! 2. Where else in the corpus does the chosen lemma occur?
//!    ([`Lexicon::find_occurrences`], [`Lexicon::count_occurrences`])
//!
//! Every query is a pure read. Storage faults are logged and reported as "no
//! results" so a broken corpus never takes the caller down with it.
//!
//! # Example
//! ```no_run
//! use classics_db::Store;
//! use classics_lexicon::Lexicon;
//! use classics_types::Language;
//!
//! # fn main() -> anyhow::Result<()> {
//! let lexicon = Lexicon::new(Store::open("/path/to/perseus_texts.db")?);
//! for entry in lexicon.resolve_all("λόγου", Language::Greek) {
//!     println!("{} {:?} {:?}", entry.lemma, entry.confidence(), entry.morph_info());
//! }
//! let total = lexicon.count_occurrences("λόγος");
//! let shown = lexicon.find_occurrences("λόγος");
//! println!("showing {} of {total}", shown.len());
//! # Ok(()) }
//! ```

mod occurrences;
mod resolve;

pub use occurrences::{OCCURRENCE_LIMIT, group_rows};
pub use resolve::confidence_shares;

/// Query front-end over a corpus store.
///
/// Generic over the storage traits so tests can substitute fakes; the store
/// is owned, wrap the lexicon in an `Arc` to share it between tasks.
pub struct Lexicon<S> {
    store: S,
}

impl<S> Lexicon<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
