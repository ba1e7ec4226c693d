use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use classics_db::{DictionaryStore, Store};
use classics_morphy::GreekLemmatizer;
use classics_types::Language;

const USAGE: &str =
    "usage: cargo run -p classics-morphy --example candidates -- [--db <corpus-db>] <word>...";

fn main() -> Result<()> {
    let mut db: Option<PathBuf> = None;
    let mut words = Vec::new();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--db" {
            db = Some(args.next().map(PathBuf::from).context(USAGE)?);
        } else {
            words.push(arg);
        }
    }
    if words.is_empty() {
        bail!(USAGE);
    }

    let store = match &db {
        Some(path) => Some(
            Store::open(path).with_context(|| format!("opening corpus at {}", path.display()))?,
        ),
        None => None,
    };

    for word in words {
        println!("\nSurface: {word}");
        let candidates = match &store {
            Some(store) => GreekLemmatizer.lemmas_for(&word, |lemma| {
                matches!(store.entry(lemma, Language::Greek), Ok(Some(_)))
            }),
            None => GreekLemmatizer.candidates(&word),
        };
        for cand in candidates {
            println!("    {:<14} [{:?}]", cand.lemma, cand.source);
        }
    }

    Ok(())
}
