use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use anyhow::Result;
use classics_db::{DictionaryStore, LemmaMap};
use classics_types::{
    DictionaryEntry, Language, LemmaMapEntry, MatchOrigin, ResolvedEntry, normalize,
};
use tracing::{debug, error};

use crate::Lexicon;

impl<S> Lexicon<S>
where
    S: LemmaMap + DictionaryStore,
{
    /// Every dictionary entry the surface `word` could belong to, ranked.
    ///
    /// 1. Normalize the word.
    /// 2. Look the key up directly as a headword.
    /// 3. Greek only: collect all lemma-map rows for the key, keep the most
    ///    confident row per lemma, and fetch each lemma's entry.
    /// 4. Order direct matches first, then by descending confidence with
    ///    unscored rows last; drop repeated lemmas.
    ///
    /// Never fails: unknown words and storage faults both yield an empty list.
    pub fn resolve_all(&self, word: &str, language: Language) -> Vec<ResolvedEntry> {
        let normalized = normalize(word, language);
        if normalized.is_empty() {
            debug!("resolve_all: {word:?} normalizes to an empty key");
            return Vec::new();
        }
        match self.try_resolve_all(&normalized, language) {
            Ok(entries) => {
                debug!(
                    "resolve_all: {word:?} -> {normalized:?} ({language}): {} entries",
                    entries.len()
                );
                entries
            }
            Err(err) => {
                error!("resolve_all failed for {word:?} ({language}): {err:#}");
                Vec::new()
            }
        }
    }

    /// Single best entry: the direct headword, else the top lemma mapping.
    pub fn resolve_first(&self, word: &str, language: Language) -> Option<ResolvedEntry> {
        let normalized = normalize(word, language);
        if normalized.is_empty() {
            return None;
        }
        self.try_resolve_first(&normalized, language)
            .unwrap_or_else(|err| {
                error!("resolve_first failed for {word:?} ({language}): {err:#}");
                None
            })
    }

    /// Most confident lemma for a surface form. Only Greek has a lemma map.
    pub fn lemma_for_word(&self, word: &str, language: Language) -> Option<String> {
        if language != Language::Greek {
            return None;
        }
        let normalized = normalize(word, language);
        if normalized.is_empty() {
            return None;
        }
        match self.store.best_mapping(&normalized) {
            Ok(mapping) => mapping.map(|m| m.lemma),
            Err(err) => {
                error!("lemma lookup failed for {word:?}: {err:#}");
                None
            }
        }
    }

    /// Headwords starting with the normalized `prefix`.
    pub fn suggest(&self, prefix: &str, language: Language, limit: usize) -> Vec<DictionaryEntry> {
        let normalized = normalize(prefix, language);
        if normalized.is_empty() || limit == 0 {
            return Vec::new();
        }
        self.store
            .search_prefix(&normalized, language, limit)
            .unwrap_or_else(|err| {
                error!("prefix search failed for {prefix:?} ({language}): {err:#}");
                Vec::new()
            })
    }

    fn try_resolve_all(&self, normalized: &str, language: Language) -> Result<Vec<ResolvedEntry>> {
        let mut entries = Vec::new();

        let has_direct = match self.store.entry(normalized, language)? {
            Some(entry) => {
                entries.push(direct_entry(normalized, &entry));
                true
            }
            None => false,
        };

        if language == Language::Greek {
            let mappings = self.store.mappings_for(normalized)?;
            for mapping in best_per_lemma(mappings) {
                let headword = normalize(&mapping.lemma, language);
                if headword.is_empty() || (has_direct && headword == normalized) {
                    continue;
                }
                if let Some(entry) = self.store.entry(&headword, language)? {
                    entries.push(mapped_entry(mapping, &entry));
                }
            }
        }

        Ok(rank(entries))
    }

    fn try_resolve_first(
        &self,
        normalized: &str,
        language: Language,
    ) -> Result<Option<ResolvedEntry>> {
        if let Some(entry) = self.store.entry(normalized, language)? {
            return Ok(Some(direct_entry(normalized, &entry)));
        }
        if language != Language::Greek {
            return Ok(None);
        }
        let Some(mapping) = self.store.best_mapping(normalized)? else {
            return Ok(None);
        };
        let headword = normalize(&mapping.lemma, language);
        Ok(self
            .store
            .entry(&headword, language)?
            .map(|entry| mapped_entry(mapping, &entry)))
    }
}

/// Display shares (percent) of the confidence among non-direct entries.
///
/// Presentation helper: entries that are direct matches or carry no
/// confidence get `None`; the rest sum to 100.
pub fn confidence_shares(entries: &[ResolvedEntry]) -> Vec<Option<f64>> {
    let total: f64 = entries
        .iter()
        .filter(|e| !e.is_direct_match())
        .filter_map(ResolvedEntry::confidence)
        .sum();
    entries
        .iter()
        .map(|e| match e.confidence() {
            Some(c) if !e.is_direct_match() && total > 0.0 => Some(c / total * 100.0),
            _ => None,
        })
        .collect()
}

fn direct_entry(normalized: &str, entry: &DictionaryEntry) -> ResolvedEntry {
    ResolvedEntry {
        lemma: normalized.to_string(),
        definition: entry.definition().to_string(),
        origin: MatchOrigin::Direct,
    }
}

fn mapped_entry(mapping: LemmaMapEntry, entry: &DictionaryEntry) -> ResolvedEntry {
    ResolvedEntry {
        lemma: mapping.lemma,
        definition: entry.definition().to_string(),
        origin: MatchOrigin::LemmaMap {
            confidence: mapping.confidence,
            morph_info: mapping.morph_info,
        },
    }
}

/// Keep the most confident row per lemma; ties keep the first row seen.
fn best_per_lemma(mappings: Vec<LemmaMapEntry>) -> Vec<LemmaMapEntry> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut best: Vec<LemmaMapEntry> = Vec::new();
    for mapping in mappings {
        match slots.get(&mapping.lemma) {
            Some(&idx) => {
                if mapping.confidence > best[idx].confidence {
                    best[idx] = mapping;
                }
            }
            None => {
                slots.insert(mapping.lemma.clone(), best.len());
                best.push(mapping);
            }
        }
    }
    best
}

fn rank(mut entries: Vec<ResolvedEntry>) -> Vec<ResolvedEntry> {
    entries.sort_by(compare_entries);
    let mut seen = HashSet::new();
    entries.retain(|e| seen.insert(e.lemma.clone()));
    entries
}

fn compare_entries(a: &ResolvedEntry, b: &ResolvedEntry) -> Ordering {
    b.is_direct_match()
        .cmp(&a.is_direct_match())
        .then_with(|| match (a.confidence(), b.confidence()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}
