//! Read-only access to a prebuilt classical-text corpus stored in SQLite.
//!
//! The corpus database carries three relations the lookup core depends on:
//! `lemma_map` (normalized surface form -> candidate lemmas with confidence),
//! `dictionary_entries` (normalized headword + language -> rendered entry) and
//! the word-position index `words` joined against `text_lines`. This crate
//! exposes them through three small traits ([`LemmaMap`], [`DictionaryStore`],
//! [`WordIndex`]) so callers can swap in fakes, and implements all three for
//! [`Store`].
//!
//! A [`Store`] is an explicitly constructed handle: open it once at startup,
//! share it by reference (or `Arc`), drop it on shutdown. File-backed stores
//! keep a small pool of connections so concurrent lookups never wait on each
//! other; in-memory stores share a single connection.
//!
//! Building or populating the corpus is out of scope. [`SCHEMA`] exists so
//! tests and tools can create an empty database with the expected layout.
//!
//! # Example
//! ```no_run
//! use classics_db::{DictionaryStore, LemmaMap, Store};
//! use classics_types::Language;
//!
//! # fn main() -> anyhow::Result<()> {
//! let store = Store::open("/path/to/perseus_texts.db")?;
//! for mapping in store.mappings_for("λογου")? {
//!     println!("{} ({:?})", mapping.lemma, mapping.confidence);
//! }
//! let entry = store.entry("λογοσ", Language::Greek)?;
//! println!("{}", entry.map(|e| e.headword).unwrap_or_default());
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p classics-db --example stats -- <db>`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow, bail};
use classics_types::{DictionaryEntry, Language, LemmaMapEntry, OccurrenceRow};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params, params_from_iter};

/// DDL for the tables and indexes the lookup queries rely on.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS text_lines (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    book_id TEXT NOT NULL,
    line_number INTEGER NOT NULL,
    line_text TEXT NOT NULL,
    line_xml TEXT,
    speaker TEXT
);
CREATE INDEX IF NOT EXISTS idx_text_lines_book ON text_lines(book_id);

CREATE TABLE IF NOT EXISTS words (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    word TEXT NOT NULL,
    word_normalized TEXT NOT NULL,
    book_id TEXT NOT NULL,
    line_number INTEGER NOT NULL,
    word_position INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_words_normalized ON words(word_normalized);
CREATE INDEX IF NOT EXISTS idx_words_book_line ON words(book_id, line_number);

CREATE TABLE IF NOT EXISTS dictionary_entries (
    id INTEGER PRIMARY KEY NOT NULL,
    headword TEXT NOT NULL,
    headword_normalized TEXT NOT NULL,
    language TEXT NOT NULL,
    entry_xml TEXT,
    entry_html TEXT,
    entry_plain TEXT,
    source TEXT,
    CHECK (language IN ('greek', 'latin'))
);
CREATE INDEX IF NOT EXISTS idx_dictionary_headword_normalized
    ON dictionary_entries(headword_normalized, language);

CREATE TABLE IF NOT EXISTS lemma_map (
    word_form TEXT NOT NULL,
    word_normalized TEXT NOT NULL,
    lemma TEXT NOT NULL,
    confidence REAL DEFAULT 1.0,
    source TEXT,
    morph_info TEXT,
    PRIMARY KEY (word_form, lemma)
);
CREATE INDEX IF NOT EXISTS idx_lemma_map_word ON lemma_map(word_form);
CREATE INDEX IF NOT EXISTS idx_lemma_map_lemma ON lemma_map(lemma);
CREATE INDEX IF NOT EXISTS idx_lemma_map_normalized ON lemma_map(word_normalized);
";

const REQUIRED_TABLES: [&str; 4] = ["lemma_map", "dictionary_entries", "words", "text_lines"];

/// How a file-backed store opens its connections.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpenMode {
    /// Shipped corpus; every connection is read-only.
    ReadOnly,
    /// Create the file if needed and allow writes (tools and tests).
    ReadWrite,
}

impl OpenMode {
    fn flags(self) -> OpenFlags {
        match self {
            OpenMode::ReadOnly => {
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX
                    | OpenFlags::SQLITE_OPEN_URI
            }
            OpenMode::ReadWrite => {
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX
                    | OpenFlags::SQLITE_OPEN_URI
            }
        }
    }
}

enum Backing {
    Pooled {
        path: PathBuf,
        mode: OpenMode,
        idle: Mutex<Vec<Connection>>,
    },
    Shared(Mutex<Connection>),
}

/// Row counts for a quick sanity check of a corpus file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StoreStats {
    pub lemma_mappings: usize,
    pub distinct_lemmas: usize,
    pub greek_entries: usize,
    pub latin_entries: usize,
    pub words: usize,
    pub distinct_word_forms: usize,
    pub lines: usize,
}

/// Handle to a corpus database.
pub struct Store {
    backing: Backing,
}

impl Store {
    /// Open a corpus file read-only and check that the lookup tables exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_mode(path, OpenMode::ReadOnly)
    }

    pub fn open_with_mode(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let first = open_connection(&path, mode)?;
        if mode == OpenMode::ReadOnly {
            check_tables(&first).with_context(|| format!("validate {}", path.display()))?;
        }
        Ok(Self {
            backing: Backing::Pooled {
                path,
                mode,
                idle: Mutex::new(vec![first]),
            },
        })
    }

    /// Fresh in-memory database with [`SCHEMA`] applied.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        conn.execute_batch(SCHEMA).context("apply schema")?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection; all lookups share it.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            backing: Backing::Shared(Mutex::new(conn)),
        }
    }

    /// Create any missing tables and indexes. Fails on read-only stores.
    pub fn apply_schema(&self) -> Result<()> {
        self.with_conn(|conn| conn.execute_batch(SCHEMA).context("apply schema"))
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.with_conn(|conn| {
            let count = |sql: &str| -> Result<usize> {
                let n: i64 = conn
                    .query_row(sql, [], |row| row.get(0))
                    .with_context(|| format!("count query `{sql}`"))?;
                Ok(n.max(0) as usize)
            };
            Ok(StoreStats {
                lemma_mappings: count("SELECT COUNT(*) FROM lemma_map")?,
                distinct_lemmas: count("SELECT COUNT(DISTINCT lemma) FROM lemma_map")?,
                greek_entries: count(
                    "SELECT COUNT(*) FROM dictionary_entries WHERE language = 'greek'",
                )?,
                latin_entries: count(
                    "SELECT COUNT(*) FROM dictionary_entries WHERE language = 'latin'",
                )?,
                words: count("SELECT COUNT(*) FROM words")?,
                distinct_word_forms: count("SELECT COUNT(DISTINCT word_normalized) FROM words")?,
                lines: count("SELECT COUNT(*) FROM text_lines")?,
            })
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        match &self.backing {
            Backing::Shared(conn) => {
                let conn = conn
                    .lock()
                    .map_err(|_| anyhow!("corpus connection lock poisoned"))?;
                f(&conn)
            }
            Backing::Pooled { path, mode, idle } => {
                let pooled = idle
                    .lock()
                    .map_err(|_| anyhow!("corpus connection pool poisoned"))?
                    .pop();
                let conn = match pooled {
                    Some(conn) => conn,
                    None => open_connection(path, *mode)?,
                };
                let out = f(&conn);
                if let Ok(mut idle) = idle.lock() {
                    idle.push(conn);
                }
                out
            }
        }
    }
}

/// Surface form -> lemma candidates.
pub trait LemmaMap {
    /// Every mapping for a normalized surface form, in corpus order.
    fn mappings_for(&self, word_normalized: &str) -> Result<Vec<LemmaMapEntry>>;

    /// The single highest-confidence mapping, if any.
    fn best_mapping(&self, word_normalized: &str) -> Result<Option<LemmaMapEntry>>;
}

/// Normalized headword -> dictionary entry.
pub trait DictionaryStore {
    /// First entry for `(headword_normalized, language)`; duplicates are not surfaced.
    fn entry(
        &self,
        headword_normalized: &str,
        language: Language,
    ) -> Result<Option<DictionaryEntry>>;

    /// Entries whose normalized headword starts with `prefix`, ordered by headword.
    fn search_prefix(
        &self,
        prefix: &str,
        language: Language,
        limit: usize,
    ) -> Result<Vec<DictionaryEntry>>;

    fn entry_count(&self, language: Language) -> Result<usize>;
}

/// Lemma -> corpus lines containing one of its surface forms.
///
/// `lemmas` lists every `lemma_map.lemma` spelling that names the same
/// lemma; a line matches if any of them maps one of its words.
pub trait WordIndex {
    /// Matched words for the first `line_limit` lines, ordered by
    /// `(book_id, line_number, position)`.
    fn occurrence_rows(&self, lemmas: &[&str], line_limit: usize) -> Result<Vec<OccurrenceRow>>;

    /// Number of distinct lines containing the lemma, without any cap.
    fn count_lines(&self, lemmas: &[&str]) -> Result<usize>;
}

const LEMMA_MAP_COLUMNS: &str = "word_form, word_normalized, lemma, confidence, morph_info, source";

impl LemmaMap for Store {
    fn mappings_for(&self, word_normalized: &str) -> Result<Vec<LemmaMapEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare_cached(&format!(
                    "SELECT {LEMMA_MAP_COLUMNS} FROM lemma_map
                     WHERE word_normalized = ?1
                     ORDER BY rowid"
                ))
                .context("prepare lemma_map lookup")?;
            let rows = stmt
                .query_map(params![word_normalized], lemma_map_row)
                .with_context(|| format!("query lemma_map for {word_normalized:?}"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .context("read lemma_map rows")
        })
    }

    fn best_mapping(&self, word_normalized: &str) -> Result<Option<LemmaMapEntry>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {LEMMA_MAP_COLUMNS} FROM lemma_map
                     WHERE word_normalized = ?1
                     ORDER BY confidence DESC, rowid
                     LIMIT 1"
                ),
                params![word_normalized],
                lemma_map_row,
            )
            .optional()
            .with_context(|| format!("query best lemma_map row for {word_normalized:?}"))
        })
    }
}

impl DictionaryStore for Store {
    fn entry(
        &self,
        headword_normalized: &str,
        language: Language,
    ) -> Result<Option<DictionaryEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT headword, headword_normalized, entry_html, entry_plain
                     FROM dictionary_entries
                     WHERE headword_normalized = ?1 AND language = ?2
                     LIMIT 1",
                )
                .context("prepare dictionary lookup")?;
            stmt.query_row(params![headword_normalized, language.as_str()], |row| {
                dictionary_row(row, language)
            })
            .optional()
            .with_context(|| format!("query dictionary for {headword_normalized:?} ({language})"))
        })
    }

    fn search_prefix(
        &self,
        prefix: &str,
        language: Language,
        limit: usize,
    ) -> Result<Vec<DictionaryEntry>> {
        let pattern = format!("{}%", escape_like(prefix));
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT headword, headword_normalized, entry_html, entry_plain
                     FROM dictionary_entries
                     WHERE headword_normalized LIKE ?1 ESCAPE '\\' AND language = ?2
                     ORDER BY headword_normalized, id
                     LIMIT ?3",
                )
                .context("prepare dictionary prefix search")?;
            let rows = stmt
                .query_map(
                    params![pattern, language.as_str(), limit_param(limit)],
                    |row| dictionary_row(row, language),
                )
                .with_context(|| format!("search dictionary for prefix {prefix:?}"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .context("read dictionary rows")
        })
    }

    fn entry_count(&self, language: Language) -> Result<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM dictionary_entries WHERE language = ?1",
                    params![language.as_str()],
                    |row| row.get(0),
                )
                .with_context(|| format!("count {language} dictionary entries"))?;
            Ok(n.max(0) as usize)
        })
    }
}

impl WordIndex for Store {
    fn occurrence_rows(&self, lemmas: &[&str], line_limit: usize) -> Result<Vec<OccurrenceRow>> {
        if lemmas.is_empty() {
            return Ok(Vec::new());
        }
        let limit_slot = lemmas.len() + 1;
        let mut values = lemma_values(lemmas);
        values.push(Value::Integer(limit_param(line_limit)));
        self.with_conn(|conn| {
            // `hits` is DISTINCT because several lemma_map rows (differing only in
            // word_form or lemma spelling) can share a normalized form.
            let mut stmt = conn
                .prepare_cached(&format!(
                    "WITH hits AS (
                         SELECT DISTINCT w.book_id, w.line_number, w.word, w.word_position
                         FROM words w
                         JOIN lemma_map lm ON lm.word_normalized = w.word_normalized
                         WHERE lm.lemma IN ({})
                     ),
                     lines AS (
                         SELECT DISTINCT book_id, line_number FROM hits
                         ORDER BY book_id, line_number
                         LIMIT ?{limit_slot}
                     )
                     SELECT h.book_id, h.line_number,
                            COALESCE((SELECT tl.line_text FROM text_lines tl
                                      WHERE tl.book_id = h.book_id
                                        AND tl.line_number = h.line_number
                                      LIMIT 1), ''),
                            h.word, h.word_position
                     FROM hits h
                     JOIN lines l ON l.book_id = h.book_id AND l.line_number = h.line_number
                     ORDER BY h.book_id, h.line_number, h.word_position",
                    placeholders(lemmas.len())
                ))
                .context("prepare occurrence lookup")?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    Ok(OccurrenceRow {
                        book_id: row.get(0)?,
                        line_number: row.get(1)?,
                        line_text: row.get(2)?,
                        word: row.get(3)?,
                        position: row.get(4)?,
                    })
                })
                .with_context(|| format!("query occurrences of {lemmas:?}"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .context("read occurrence rows")
        })
    }

    fn count_lines(&self, lemmas: &[&str]) -> Result<usize> {
        if lemmas.is_empty() {
            return Ok(0);
        }
        let values = lemma_values(lemmas);
        self.with_conn(|conn| {
            let n: i64 = conn
                .query_row(
                    &format!(
                        "SELECT COUNT(*) FROM (
                             SELECT DISTINCT w.book_id, w.line_number
                             FROM words w
                             JOIN lemma_map lm ON lm.word_normalized = w.word_normalized
                             WHERE lm.lemma IN ({})
                         )",
                        placeholders(lemmas.len())
                    ),
                    params_from_iter(values.iter()),
                    |row| row.get(0),
                )
                .with_context(|| format!("count occurrences of {lemmas:?}"))?;
            Ok(n.max(0) as usize)
        })
    }
}

fn open_connection(path: &Path, mode: OpenMode) -> Result<Connection> {
    Connection::open_with_flags(path, mode.flags())
        .with_context(|| format!("open corpus database {}", path.display()))
}

fn check_tables(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    for table in REQUIRED_TABLES {
        if !stmt.exists(params![table])? {
            bail!("corpus database is missing table `{table}`");
        }
    }
    Ok(())
}

fn lemma_map_row(row: &Row<'_>) -> rusqlite::Result<LemmaMapEntry> {
    Ok(LemmaMapEntry {
        word_form: row.get(0)?,
        word_normalized: row.get(1)?,
        lemma: row.get(2)?,
        confidence: row.get(3)?,
        morph_info: row.get(4)?,
        source: row.get(5)?,
    })
}

fn dictionary_row(row: &Row<'_>, language: Language) -> rusqlite::Result<DictionaryEntry> {
    Ok(DictionaryEntry {
        headword: row.get(0)?,
        headword_normalized: row.get(1)?,
        language,
        entry_html: row.get(2)?,
        entry_plain: row.get(3)?,
    })
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `?1, ?2, ..., ?n`
fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

fn lemma_values(lemmas: &[&str]) -> Vec<Value> {
    lemmas.iter().map(|lemma| Value::Text(lemma.to_string())).collect()
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_placeholders() {
        assert_eq!(placeholders(1), "?1");
        assert_eq!(placeholders(3), "?1, ?2, ?3");
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("λογ"), "λογ");
        assert_eq!(escape_like("a%b_c\\"), "a\\%b\\_c\\\\");
    }

    #[test]
    fn in_memory_store_starts_empty() {
        let store = Store::open_in_memory().expect("in-memory store");
        assert_eq!(store.stats().expect("stats"), StoreStats::default());
        assert!(store.mappings_for("λογοσ").expect("lookup").is_empty());
        assert!(store.entry("λογοσ", Language::Greek).expect("lookup").is_none());
        assert_eq!(store.count_lines(&["λόγος"]).expect("count"), 0);
        assert!(store.occurrence_rows(&[], 10).expect("rows").is_empty());
    }

    #[test]
    fn apply_schema_is_repeatable() {
        let store = Store::open_in_memory().expect("in-memory store");
        store.apply_schema().expect("second apply");
    }
}
