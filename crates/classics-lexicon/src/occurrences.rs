use std::collections::BTreeMap;

use anyhow::Result;
use classics_db::{DictionaryStore, LemmaMap, WordIndex};
use classics_types::{Language, OccurrenceRecord, OccurrenceRow, WordMatch, normalize};
use tracing::{debug, error};

use crate::Lexicon;

/// Most lines [`Lexicon::find_occurrences`] returns for one lemma.
pub const OCCURRENCE_LIMIT: usize = 500;

impl<S: LemmaMap + DictionaryStore + WordIndex> Lexicon<S> {
    /// Corpus lines containing a form of `lemma`, ordered by book then line
    /// and capped at [`OCCURRENCE_LIMIT`]. Always starts from the first line.
    ///
    /// `lemma` may be spelled as the lemma map stores it (`λόγος`) or as a
    /// normalized key (`λογοσ`, what a direct match reports).
    pub fn find_occurrences(&self, lemma: &str) -> Vec<OccurrenceRecord> {
        let lemma = lemma.trim();
        if lemma.is_empty() {
            return Vec::new();
        }
        match self.try_find_occurrences(lemma) {
            Ok(records) => {
                debug!("find_occurrences: {lemma:?}: {} lines", records.len());
                records
            }
            Err(err) => {
                error!("find_occurrences failed for {lemma:?}: {err:#}");
                Vec::new()
            }
        }
    }

    /// Total number of lines containing `lemma`, independent of the display cap.
    pub fn count_occurrences(&self, lemma: &str) -> usize {
        let lemma = lemma.trim();
        if lemma.is_empty() {
            return 0;
        }
        self.try_count_occurrences(lemma).unwrap_or_else(|err| {
            error!("count_occurrences failed for {lemma:?}: {err:#}");
            0
        })
    }

    fn try_find_occurrences(&self, lemma: &str) -> Result<Vec<OccurrenceRecord>> {
        let spellings = self.lemma_spellings(lemma)?;
        let spellings: Vec<&str> = spellings.iter().map(String::as_str).collect();
        let mut records = group_rows(self.store.occurrence_rows(&spellings, OCCURRENCE_LIMIT)?);
        records.truncate(OCCURRENCE_LIMIT);
        Ok(records)
    }

    fn try_count_occurrences(&self, lemma: &str) -> Result<usize> {
        let spellings = self.lemma_spellings(lemma)?;
        let spellings: Vec<&str> = spellings.iter().map(String::as_str).collect();
        self.store.count_lines(&spellings)
    }

    /// `lemma` plus every `lemma_map.lemma` spelling that normalizes to the
    /// same Greek key: the dictionary headword for that key and the lemmas
    /// mapped from the key as a surface form.
    fn lemma_spellings(&self, lemma: &str) -> Result<Vec<String>> {
        let mut spellings = vec![lemma.to_string()];
        let key = normalize(lemma, Language::Greek);
        if key.is_empty() {
            return Ok(spellings);
        }
        let headword = self
            .store
            .entry(&key, Language::Greek)?
            .map(|entry| entry.headword);
        let mapped = self
            .store
            .mappings_for(&key)?
            .into_iter()
            .map(|mapping| mapping.lemma);
        for spelling in headword.into_iter().chain(mapped) {
            if normalize(&spelling, Language::Greek) == key && !spellings.contains(&spelling) {
                spellings.push(spelling);
            }
        }
        Ok(spellings)
    }
}

/// Fold matched-word rows into one record per `(book, line)`.
///
/// Records come out ordered by book then line number regardless of input
/// order; each record lists its matches by position, once each.
pub fn group_rows(rows: impl IntoIterator<Item = OccurrenceRow>) -> Vec<OccurrenceRecord> {
    let mut lines: BTreeMap<(String, u32), OccurrenceRecord> = BTreeMap::new();
    for row in rows {
        let record = lines
            .entry((row.book_id.clone(), row.line_number))
            .or_insert_with(|| OccurrenceRecord {
                book_id: row.book_id,
                line_number: row.line_number,
                line_text: row.line_text,
                matches: Vec::new(),
            });
        record.matches.push(WordMatch {
            word: row.word,
            position: row.position,
        });
    }
    lines
        .into_values()
        .map(|mut record| {
            record
                .matches
                .sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.word.cmp(&b.word)));
            record.matches.dedup();
            record
        })
        .collect()
}
