use classics_db::Store;
use classics_lexicon::{Lexicon, OCCURRENCE_LIMIT, confidence_shares};
use classics_types::{Language, normalize};
use rusqlite::{Connection, params};

fn map(conn: &Connection, form: &str, lemma: &str, confidence: Option<f64>, morph: Option<&str>) {
    conn.execute(
        "INSERT INTO lemma_map (word_form, word_normalized, lemma, confidence, morph_info)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![form, normalize(form, Language::Greek), lemma, confidence, morph],
    )
    .unwrap();
}

fn headword(conn: &Connection, headword: &str, language: Language, plain: &str) {
    conn.execute(
        "INSERT INTO dictionary_entries (headword, headword_normalized, language, entry_plain)
         VALUES (?1, ?2, ?3, ?4)",
        params![headword, normalize(headword, language), language.as_str(), plain],
    )
    .unwrap();
}

fn line(conn: &Connection, book: &str, number: u32, text: &str) {
    conn.execute(
        "INSERT INTO text_lines (book_id, line_number, line_text) VALUES (?1, ?2, ?3)",
        params![book, number, text],
    )
    .unwrap();
    for (position, word) in text.split_whitespace().enumerate() {
        conn.execute(
            "INSERT INTO words (word, word_normalized, book_id, line_number, word_position)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![word, normalize(word, Language::Greek), book, number, position as u32],
        )
        .unwrap();
    }
}

fn corpus() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(classics_db::SCHEMA).unwrap();
    map(&conn, "λόγος", "λόγος", Some(1.0), None);
    map(&conn, "λόγου", "λόγος", Some(0.8), Some("gen_sg"));
    map(&conn, "λόγον", "λόγος", Some(0.9), Some("acc_sg"));
    map(&conn, "ἄγε", "ἄγω", Some(0.3), Some("imperat"));
    map(&conn, "ἄγε", "ἄγνυμι", Some(0.6), None);
    map(&conn, "ἄγε", "ἀγός", None, None);
    headword(&conn, "λόγος", Language::Greek, "word, speech");
    headword(&conn, "ἄγε", Language::Greek, "come on!");
    headword(&conn, "ἄγω", Language::Greek, "lead");
    headword(&conn, "ἄγνυμι", Language::Greek, "break");
    headword(&conn, "ἀγός", Language::Greek, "leader");
    headword(&conn, "amor", Language::Latin, "love");
    headword(&conn, "amo", Language::Latin, "to love");
    conn
}

#[test]
fn inflected_form_resolves_through_the_lemma_map() {
    let lexicon = Lexicon::new(Store::from_connection(corpus()));
    let entries = lexicon.resolve_all("λόγου", Language::Greek);
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.lemma, "λόγος");
    assert!(!entry.is_direct_match());
    assert_eq!(entry.confidence(), Some(0.8));
    assert_eq!(entry.morph_info(), Some("gen_sg"));
    assert_eq!(entry.definition, "word, speech");
}

#[test]
fn trailing_punctuation_resolves_identically() {
    let lexicon = Lexicon::new(Store::from_connection(corpus()));
    let bare = lexicon.resolve_all("λόγος", Language::Greek);
    assert!(!bare.is_empty());
    assert_eq!(lexicon.resolve_all("λόγος,", Language::Greek), bare);
    assert_eq!(lexicon.resolve_all("ΛΟΓΟΣ·", Language::Greek), bare);
}

#[test]
fn latin_lookup_never_reads_the_lemma_map() {
    let conn = corpus();
    conn.execute_batch("DROP TABLE lemma_map").unwrap();
    let lexicon = Lexicon::new(Store::from_connection(conn));

    let entries = lexicon.resolve_all("Amor.", Language::Latin);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_direct_match());
    assert_eq!(entries[0].definition, "love");

    // A Greek lookup does need the table, and degrades to nothing without it.
    assert!(lexicon.resolve_all("λόγου", Language::Greek).is_empty());
}

#[test]
fn ranking_properties_hold() {
    let lexicon = Lexicon::new(Store::from_connection(corpus()));
    let entries = lexicon.resolve_all("ἄγε", Language::Greek);
    let lemmas: Vec<_> = entries.iter().map(|e| e.lemma.as_str()).collect();
    assert_eq!(lemmas, vec!["αγε", "ἄγνυμι", "ἄγω", "ἀγός"]);

    let mut seen = std::collections::HashSet::new();
    assert!(entries.iter().all(|e| seen.insert(e.lemma.clone())));

    let first_mapped = entries.iter().position(|e| !e.is_direct_match()).unwrap();
    assert!(entries[first_mapped..].iter().all(|e| !e.is_direct_match()));

    let scored: Vec<f64> = entries.iter().filter_map(|e| e.confidence()).collect();
    assert!(scored.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(entries.last().unwrap().confidence(), None);

    let shares = confidence_shares(&entries);
    let total: f64 = shares.iter().flatten().sum();
    assert!((total - 100.0).abs() < 1e-9);
}

#[test]
fn unknown_words_resolve_to_nothing() {
    let lexicon = Lexicon::new(Store::from_connection(corpus()));
    assert!(lexicon.resolve_all("ἄγνωστος", Language::Greek).is_empty());
    assert!(lexicon.resolve_all("", Language::Greek).is_empty());
    assert!(lexicon.resolve_all("ignotus", Language::Latin).is_empty());
    assert!(lexicon.resolve_first("ignotus", Language::Latin).is_none());
}

#[test]
fn single_result_and_lemma_helpers() {
    let lexicon = Lexicon::new(Store::from_connection(corpus()));
    let first = lexicon.resolve_first("λόγον", Language::Greek).unwrap();
    assert_eq!(first.lemma, "λόγος");
    assert_eq!(first.morph_info(), Some("acc_sg"));
    assert_eq!(
        lexicon.lemma_for_word("ἄγε", Language::Greek).as_deref(),
        Some("ἄγνυμι")
    );
    let suggestions = lexicon.suggest("ἀγ", Language::Greek, 10);
    let headwords: Vec<_> = suggestions.iter().map(|e| e.headword.as_str()).collect();
    assert_eq!(headwords, vec!["ἄγε", "ἄγνυμι", "ἀγός", "ἄγω"]);
}

#[test]
fn occurrences_are_capped_and_counted_separately() {
    let mut conn = corpus();
    let tx = conn.transaction().unwrap();
    for n in 1..=501 {
        line(&tx, "tlg0012.tlg001", n, "τὸν λόγον ἔειπε");
    }
    tx.commit().unwrap();
    let lexicon = Lexicon::new(Store::from_connection(conn));

    let records = lexicon.find_occurrences("λόγος");
    assert_eq!(records.len(), OCCURRENCE_LIMIT);
    assert_eq!(lexicon.count_occurrences("λόγος"), 501);
    assert_eq!(records[0].line_number, 1);
    assert_eq!(records[499].line_number, 500);
}

#[test]
fn occurrence_lines_report_each_matching_word() {
    let conn = corpus();
    line(&conn, "tlg0012.tlg002", 4, "λόγου ἄλλο λόγον");
    line(&conn, "tlg0012.tlg001", 9, "λόγος,");
    line(&conn, "tlg0012.tlg001", 3, "οὐδὲν");
    let lexicon = Lexicon::new(Store::from_connection(conn));

    let records = lexicon.find_occurrences("λόγος");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].book_id, "tlg0012.tlg001");
    assert_eq!(records[0].line_number, 9);
    assert_eq!(records[0].matches[0].word, "λόγος,");
    assert_eq!(records[1].line_text, "λόγου ἄλλο λόγον");
    let positions: Vec<_> = records[1].matches.iter().map(|m| m.position).collect();
    assert_eq!(positions, vec![0, 2]);

    assert!(lexicon.count_occurrences("λόγος") >= records.len());
    assert!(lexicon.find_occurrences("μῆνις").is_empty());
    assert_eq!(lexicon.count_occurrences("μῆνις"), 0);
}

#[test]
fn direct_match_lemma_finds_the_same_lines_as_the_mapped_spelling() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(classics_db::SCHEMA).unwrap();
    map(&conn, "λογοσ", "λόγος", Some(1.0), None);
    headword(&conn, "λογοσ", Language::Greek, "word");
    line(&conn, "tlg0012.tlg001", 1, "λόγος");
    let lexicon = Lexicon::new(Store::from_connection(conn));

    let entries = lexicon.resolve_all("λογοσ", Language::Greek);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_direct_match());
    let lemma = &entries[0].lemma;
    assert_eq!(lemma, "λογοσ");

    let records = lexicon.find_occurrences(lemma);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].matches[0].word, "λόγος");
    assert_eq!(records, lexicon.find_occurrences("λόγος"));
    assert_eq!(lexicon.count_occurrences(lemma), 1);
    assert_eq!(lexicon.count_occurrences("λόγος"), 1);
}

#[test]
fn direct_match_lemma_falls_back_to_the_dictionary_spelling() {
    // The lemma never appears as a surface form of its own, so only the
    // dictionary headword carries the map's accented spelling.
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(classics_db::SCHEMA).unwrap();
    map(&conn, "λόγου", "λόγος", Some(0.8), Some("gen_sg"));
    headword(&conn, "λόγος", Language::Greek, "word");
    line(&conn, "tlg0012.tlg001", 5, "τοῦ λόγου");
    let lexicon = Lexicon::new(Store::from_connection(conn));

    let entries = lexicon.resolve_all("λόγος", Language::Greek);
    assert!(entries[0].is_direct_match());
    let records = lexicon.find_occurrences(&entries[0].lemma);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].line_number, 5);
    assert_eq!(lexicon.count_occurrences(&entries[0].lemma), 1);
}
