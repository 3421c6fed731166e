use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use tabrus_core::error::{Error, Result};
use tabrus_core::types::{DictionaryEntry, Direction, EntryId};
use tabrus_morph::normalize_key;
use tabrus_text::TranslationIndex;

use crate::fuzzy::FuzzyIndex;
use crate::loader::load_entries;

/// Keys a Russian sense is reachable by: the whole sense, and each
/// comma/semicolon separated part with parenthesised glosses removed.
fn sense_keys(sense: &str) -> Vec<String> {
    let mut keys = vec![normalize_key(sense)];
    let mut bare = String::with_capacity(sense.len());
    let mut depth = 0usize;
    for c in sense.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => bare.push(c),
            _ => {}
        }
    }
    for part in bare.split([',', ';']) {
        let key = normalize_key(part);
        if !key.is_empty() && !keys.contains(&key) { keys.push(key); }
    }
    keys.retain(|k| !k.is_empty());
    keys
}

/// Immutable, fully indexed view of one dictionary load.
pub struct DictionaryIndex {
    /// Sorted by id.
    entries: Vec<DictionaryEntry>,
    by_id: HashMap<EntryId, usize>,
    headwords: BTreeMap<String, Vec<usize>>,
    senses: HashMap<String, Vec<usize>>,
    roots: HashMap<String, Vec<usize>>,
    headword_fuzzy: FuzzyIndex,
    sense_fuzzy: FuzzyIndex,
    translations: TranslationIndex,
}

impl DictionaryIndex {
    /// Index `entries`. Entries without translations or without a headword
    /// are dropped; duplicate ids, or nothing left to index, make the whole
    /// load invalid.
    pub fn build(entries: Vec<DictionaryEntry>, fuzzy_max_distance: usize) -> Result<Self> {
        let total = entries.len();
        let mut entries: Vec<DictionaryEntry> = entries
            .into_iter()
            .filter(|e| !e.word.trim().is_empty() && e.translations.iter().any(|t| !t.trim().is_empty()))
            .map(|mut e| {
                e.translations.retain(|t| !t.trim().is_empty());
                if e.word_normalized.trim().is_empty() { e.word_normalized = normalize_key(&e.word); }
                e
            })
            .collect();
        if entries.len() < total { warn!(dropped = total - entries.len(), "entries without headword or translations skipped"); }
        if entries.is_empty() {
            return Err(Error::DictionaryUnavailable(format!("no usable entries ({} read)", total)));
        }
        entries.sort_by_key(|e| e.id);
        if let Some(w) = entries.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(Error::DictionaryUnavailable(format!("duplicate entry id {}", w[0].id)));
        }

        let mut by_id = HashMap::new();
        let mut headwords: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut senses: HashMap<String, Vec<usize>> = HashMap::new();
        let mut roots: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, e) in entries.iter().enumerate() {
            by_id.insert(e.id, pos);
            let mut keys = vec![normalize_key(&e.word_normalized)];
            let word_key = normalize_key(&e.word);
            if !keys.contains(&word_key) { keys.push(word_key); }
            for key in keys { headwords.entry(key).or_default().push(pos); }
            for sense in &e.translations {
                for key in sense_keys(sense) {
                    let slot = senses.entry(key).or_default();
                    if !slot.contains(&pos) { slot.push(pos); }
                }
            }
            if let Some(root) = e.root.as_deref().map(normalize_key).filter(|r| !r.is_empty()) {
                roots.entry(root).or_default().push(pos);
            }
        }

        // verified entries first, then by id (positions are already id-ordered)
        let rank = |slot: &mut Vec<usize>| slot.sort_by_key(|&p| (!entries[p].is_verified, p));
        headwords.values_mut().for_each(rank);
        senses.values_mut().for_each(rank);
        roots.values_mut().for_each(rank);

        let headword_fuzzy = FuzzyIndex::build(headwords.keys().map(String::as_str), fuzzy_max_distance);
        let sense_fuzzy = FuzzyIndex::build(senses.keys().map(String::as_str), fuzzy_max_distance);
        let translations = TranslationIndex::build(&entries).map_err(|e| Error::DictionaryUnavailable(format!("translation index: {}", e)))?;

        info!(entries = entries.len(), headwords = headwords.len(), senses = senses.len(), "dictionary indexed");
        Ok(Self { entries, by_id, headwords, senses, roots, headword_fuzzy, sense_fuzzy, translations })
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn entries(&self) -> &[DictionaryEntry] { &self.entries }

    fn keys(&self, direction: Direction) -> KeyView<'_> {
        match direction {
            Direction::TabRus => KeyView::Ordered(&self.headwords),
            Direction::RusTab => KeyView::Hashed(&self.senses),
        }
    }

    fn fuzzy(&self, direction: Direction) -> &FuzzyIndex {
        match direction {
            Direction::TabRus => &self.headword_fuzzy,
            Direction::RusTab => &self.sense_fuzzy,
        }
    }

    fn resolve(&self, positions: &[usize]) -> Vec<&DictionaryEntry> { positions.iter().map(|&p| &self.entries[p]).collect() }

    /// Entries whose source-language key equals `word` after normalization,
    /// verified first, then by id.
    pub fn lookup_exact(&self, word: &str, direction: Direction) -> Vec<&DictionaryEntry> {
        let key = normalize_key(word);
        self.keys(direction).get(&key).map(|p| self.resolve(p)).unwrap_or_default()
    }

    /// Entries within `max_distance` edits of `word`, nearest first; at equal
    /// distance verified first, then by id. Each entry appears once.
    pub fn lookup_fuzzy(&self, word: &str, direction: Direction, max_distance: usize) -> Vec<(&DictionaryEntry, usize)> {
        let key = normalize_key(word);
        if key.is_empty() { return Vec::new(); }
        let keys = self.keys(direction);
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (candidate, distance) in self.fuzzy(direction).search(&key, max_distance) {
            for &pos in keys.get(candidate).map(Vec::as_slice).unwrap_or_default() {
                if seen.insert(pos) { out.push((&self.entries[pos], distance)); }
            }
        }
        out.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| entry_rank(a.0, b.0)));
        out
    }

    pub fn get_by_id(&self, id: EntryId) -> Option<&DictionaryEntry> { self.by_id.get(&id).map(|&p| &self.entries[p]) }

    /// Distinct headwords starting with `prefix`, in key order.
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        let prefix = normalize_key(prefix);
        if prefix.is_empty() { return Vec::new(); }
        let mut out: Vec<String> = Vec::new();
        for (_, positions) in self.headwords.range(prefix.clone()..).take_while(|(k, _)| k.starts_with(&prefix)) {
            for &pos in positions {
                let word = &self.entries[pos].word;
                if !out.contains(word) { out.push(word.clone()); }
            }
            if out.len() >= limit { break; }
        }
        out.truncate(limit);
        out
    }

    pub fn lookup_by_root(&self, root: &str) -> Vec<&DictionaryEntry> {
        self.roots.get(&normalize_key(root)).map(|p| self.resolve(p)).unwrap_or_default()
    }

    /// Entries whose Russian translations contain `word` (stemmed full-text match).
    pub fn search_target(&self, word: &str, limit: usize) -> Result<Vec<&DictionaryEntry>> {
        let hits = self.translations.search(word, limit).map_err(|e| Error::Operation(format!("translation search: {}", e)))?;
        let mut found: Vec<(&DictionaryEntry, f32)> = hits.iter().filter_map(|h| self.get_by_id(h.entry_id).map(|e| (e, h.score))).collect();
        found.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| entry_rank(a.0, b.0)));
        Ok(found.into_iter().map(|(e, _)| e).collect())
    }

    /// Lookup surface for detail views: exact matches, or when there are none
    /// and `fuzzy` is set, up to `limit` fuzzy matches.
    pub fn lookup_word(&self, word: &str, direction: Direction, fuzzy: bool, max_distance: usize, limit: usize) -> Vec<&DictionaryEntry> {
        let exact = self.lookup_exact(word, direction);
        if !exact.is_empty() || !fuzzy { return exact; }
        self.lookup_fuzzy(word, direction, max_distance).into_iter().take(limit).map(|(e, _)| e).collect()
    }
}

/// Tie-break shared by every lookup: verified first, then id ascending.
pub fn entry_rank(a: &DictionaryEntry, b: &DictionaryEntry) -> Ordering { b.is_verified.cmp(&a.is_verified).then(a.id.cmp(&b.id)) }

enum KeyView<'a> {
    Ordered(&'a BTreeMap<String, Vec<usize>>),
    Hashed(&'a HashMap<String, Vec<usize>>),
}

impl<'a> KeyView<'a> {
    fn get(&self, key: &str) -> Option<&'a Vec<usize>> {
        match self {
            KeyView::Ordered(m) => m.get(key),
            KeyView::Hashed(m) => m.get(key),
        }
    }
}

/// Process-wide handle to the current dictionary snapshot.
///
/// Readers clone the `Arc` and keep using it for the whole request; a reload
/// builds the next index off to the side and swaps the pointer.
pub struct DictionaryStore {
    current: RwLock<Option<Arc<DictionaryIndex>>>,
    fuzzy_max_distance: usize,
}

impl DictionaryStore {
    pub fn new(index: DictionaryIndex) -> Self {
        let fuzzy_max_distance = index.headword_fuzzy.max_distance();
        Self { current: RwLock::new(Some(Arc::new(index))), fuzzy_max_distance }
    }

    /// A store with nothing loaded; every request against it fails with
    /// `DictionaryUnavailable` until a successful reload.
    pub fn unavailable(fuzzy_max_distance: usize) -> Self { Self { current: RwLock::new(None), fuzzy_max_distance } }

    pub fn from_entries(entries: Vec<DictionaryEntry>, fuzzy_max_distance: usize) -> Result<Self> {
        Ok(Self::new(DictionaryIndex::build(entries, fuzzy_max_distance)?))
    }

    pub fn open(path: &Path, fuzzy_max_distance: usize) -> Result<Self> { Self::from_entries(load_entries(path)?, fuzzy_max_distance) }

    pub fn snapshot(&self) -> Result<Arc<DictionaryIndex>> {
        let guard = self.current.read().map_err(|_| Error::DictionaryUnavailable("store lock poisoned".to_string()))?;
        guard.clone().ok_or_else(|| Error::DictionaryUnavailable("no dictionary loaded".to_string()))
    }

    pub fn is_loaded(&self) -> bool { self.snapshot().is_ok() }

    /// Build a new index from `entries` and swap it in. On failure the
    /// previous snapshot stays in place.
    pub fn reload(&self, entries: Vec<DictionaryEntry>) -> Result<()> {
        let next = Arc::new(DictionaryIndex::build(entries, self.fuzzy_max_distance)?);
        let mut guard = self.current.write().map_err(|_| Error::DictionaryUnavailable("store lock poisoned".to_string()))?;
        *guard = Some(next);
        Ok(())
    }
}
