use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use classics_db::{DictionaryStore, LemmaMap, Store, WordIndex};
use classics_types::{Language, normalize};

fn main() -> Result<()> {
    let db_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p classics-db --example stats -- <path-to-corpus-db>")?;

    let store = Store::open(&db_path)
        .with_context(|| format!("opening corpus at {}", db_path.display()))?;
    let stats = store.stats()?;

    println!("Corpus: {}", db_path.display());
    println!("Lemma mappings : {}", stats.lemma_mappings);
    println!("Distinct lemmas: {}", stats.distinct_lemmas);
    println!("Greek entries  : {}", stats.greek_entries);
    println!("Latin entries  : {}", stats.latin_entries);
    println!("Indexed words  : {}", stats.words);
    println!("Distinct forms : {}", stats.distinct_word_forms);
    println!("Text lines     : {}", stats.lines);

    // Spot-check a couple of headwords to confirm lookup.
    for (language, word) in [(Language::Greek, "λόγος"), (Language::Latin, "amor")] {
        let key = normalize(word, language);
        println!(
            "Headword '{}' ({}) present? {}",
            word,
            language,
            store.entry(&key, language)?.is_some()
        );
    }

    let key = normalize("λόγου", Language::Greek);
    for mapping in store.mappings_for(&key)? {
        println!(
            "  {} -> {} ({:?}, {})",
            mapping.word_form,
            mapping.lemma,
            mapping.confidence,
            mapping.morph_info.as_deref().unwrap_or("-")
        );
    }
    println!("Lines with λόγος: {}", store.count_lines(&["λόγος"])?);

    Ok(())
}
