use std::env;
use std::path::PathBuf;

use classics_db::{DictionaryStore, LemmaMap, Store, WordIndex};
use classics_types::{Language, normalize};

fn corpus_path() -> Option<PathBuf> {
    env::var("CORPUS_DB").ok().map(PathBuf::from)
}

#[test]
fn reads_a_real_corpus() {
    let Some(path) = corpus_path() else {
        eprintln!("skipping: CORPUS_DB not set");
        return;
    };
    let store = Store::open(&path).expect("open corpus");
    let stats = store.stats().expect("stats");
    assert!(stats.greek_entries > 0);
    assert!(stats.lemma_mappings > 0);

    let key = normalize("λόγος", Language::Greek);
    assert!(store.entry(&key, Language::Greek).expect("lookup").is_some());
    assert!(!store.mappings_for(&key).expect("mappings").is_empty());

    let total = store.count_lines(&["λόγος"]).expect("count");
    let rows = store.occurrence_rows(&["λόγος"], 500).expect("rows");
    assert!(total >= 1);
    assert!(!rows.is_empty());
}
