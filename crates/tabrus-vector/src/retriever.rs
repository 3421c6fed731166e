use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use tabrus_core::traits::Embedder;
use tabrus_core::types::{DictionaryEntry, Direction};

use crate::cache::{content_hash, EmbeddingCache};
use crate::ops::cosine_similarity;

const EMBED_BATCH: usize = 32;

/// One example sentence pair, oriented for a direction: `source_text` is
/// what gets embedded and compared against the query.
#[derive(Debug, Clone)]
pub struct IndexedExample {
    pub example_id: String,
    pub embedding: Vec<f32>,
    pub source_text: String,
    pub target_text: String,
}

/// Immutable retrieval index. Never mutated after construction.
pub struct RetrievalSnapshot {
    tab_rus: Vec<IndexedExample>,
    rus_tab: Vec<IndexedExample>,
    embedder_id: String,
    built_at: Option<DateTime<Utc>>,
}

impl RetrievalSnapshot {
    fn empty(embedder_id: &str) -> Self { Self { tab_rus: Vec::new(), rus_tab: Vec::new(), embedder_id: embedder_id.to_string(), built_at: None } }

    /// Number of example pairs.
    pub fn len(&self) -> usize { self.tab_rus.len() }

    pub fn is_empty(&self) -> bool { self.tab_rus.is_empty() }

    pub fn built_at(&self) -> Option<DateTime<Utc>> { self.built_at }

    pub fn examples(&self, direction: Direction) -> &[IndexedExample] {
        match direction {
            Direction::TabRus => &self.tab_rus,
            Direction::RusTab => &self.rus_tab,
        }
    }

    /// Top `k` pairs by cosine similarity to `query`, most similar first;
    /// equal scores keep index order.
    pub fn rank(&self, query: &[f32], direction: Direction, k: usize) -> Vec<(String, String)> {
        let examples = self.examples(direction);
        let mut scored: Vec<(usize, f32)> = examples.iter().enumerate().map(|(i, ex)| (i, cosine_similarity(query, &ex.embedding))).collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .take(k)
            .map(|(i, _)| (examples[i].source_text.clone(), examples[i].target_text.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalStatus {
    pub examples: usize,
    pub embedder_id: String,
    pub built_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub examples: usize,
    /// Distinct sentences sent to the embedder.
    pub embedded: usize,
    /// Distinct sentences served from the cache.
    pub cached: usize,
}

pub struct ExampleRetriever {
    embedder: Arc<dyn Embedder>,
    current: RwLock<Arc<RetrievalSnapshot>>,
    cache: EmbeddingCache,
}

impl ExampleRetriever {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        let empty = RetrievalSnapshot::empty(embedder.id());
        Self { embedder, current: RwLock::new(Arc::new(empty)), cache: EmbeddingCache::new() }
    }

    pub fn embedder_id(&self) -> &str { self.embedder.id() }

    pub fn snapshot(&self) -> Arc<RetrievalSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize { self.snapshot().len() }

    pub fn is_empty(&self) -> bool { self.snapshot().is_empty() }

    /// Sentences currently held in the embedding cache.
    pub fn cached_embeddings(&self) -> usize { self.cache.len() }

    pub fn status(&self) -> RetrievalStatus {
        let snap = self.snapshot();
        RetrievalStatus { examples: snap.len(), embedder_id: snap.embedder_id.clone(), built_at: snap.built_at }
    }

    pub fn index(&self, entries: &[DictionaryEntry]) -> Result<IndexStats> { self.index_with_progress(entries, &ProgressBar::hidden()) }

    /// Rebuild the index from every example of `entries` and swap it in.
    ///
    /// Always a full replace: examples no longer present in `entries` are gone
    /// from the new snapshot. On error the current snapshot is kept.
    pub fn index_with_progress(&self, entries: &[DictionaryEntry], pb: &ProgressBar) -> Result<IndexStats> {
        let pairs = collect_pairs(entries);

        let mut seen = HashSet::new();
        let mut texts: Vec<(String, String)> = Vec::new();
        for (_, tab, rus) in &pairs {
            for text in [tab, rus] {
                let hash = content_hash(text);
                if seen.insert(hash.clone()) { texts.push((hash, text.clone())); }
            }
        }
        let hashes: Vec<String> = texts.iter().map(|(h, _)| h.clone()).collect();
        let live: HashSet<String> = hashes.iter().cloned().collect();
        let eid = self.embedder.id().to_string();
        let mut vectors = self.cache.get_many(&eid, &hashes);
        let cached = vectors.len();
        let missing: Vec<&(String, String)> = texts.iter().filter(|(h, _)| !vectors.contains_key(h)).collect();

        pb.set_length(missing.len() as u64);
        for batch in missing.chunks(EMBED_BATCH) {
            let inputs: Vec<String> = batch.iter().map(|(_, t)| t.clone()).collect();
            let embs = self.embedder.embed_batch(&inputs)?;
            if embs.len() != inputs.len() { bail!("embedder returned {} vectors for {} texts", embs.len(), inputs.len()); }
            let mut fresh = Vec::with_capacity(embs.len());
            for ((hash, _), v) in batch.iter().zip(embs) {
                if v.len() != self.embedder.dim() { bail!("embedding dim {} != {}", v.len(), self.embedder.dim()); }
                fresh.push((hash.clone(), v));
            }
            self.cache.put_many(&eid, fresh.iter().cloned());
            vectors.extend(fresh);
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();

        let mut tab_rus = Vec::with_capacity(pairs.len());
        let mut rus_tab = Vec::with_capacity(pairs.len());
        for (example_id, tab, rus) in pairs {
            let (Some(tab_vec), Some(rus_vec)) = (vectors.get(&content_hash(&tab)), vectors.get(&content_hash(&rus))) else { continue };
            tab_rus.push(IndexedExample { example_id: example_id.clone(), embedding: tab_vec.clone(), source_text: tab.clone(), target_text: rus.clone() });
            rus_tab.push(IndexedExample { example_id, embedding: rus_vec.clone(), source_text: rus, target_text: tab });
        }
        let stats = IndexStats { examples: tab_rus.len(), embedded: missing.len(), cached };
        let next = Arc::new(RetrievalSnapshot { tab_rus, rus_tab, embedder_id: eid.clone(), built_at: Some(Utc::now()) });
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
        self.cache.retain(&eid, &live);
        info!(examples = stats.examples, embedded = stats.embedded, cached = stats.cached, "retrieval index rebuilt");
        Ok(stats)
    }

    /// Up to `k` example pairs most similar to `text`, oriented for `direction`.
    ///
    /// Never fails: an empty index or an embedder error yields no examples.
    pub fn retrieve(&self, text: &str, direction: Direction, k: usize) -> Vec<(String, String)> {
        let snap = self.snapshot();
        if k == 0 || text.trim().is_empty() || snap.is_empty() { return Vec::new(); }
        let query = match self.embedder.embed_batch(&[text.to_string()]) {
            Ok(mut v) if !v.is_empty() => v.swap_remove(0),
            Ok(_) => { warn!("embedder returned no vector for query"); return Vec::new(); }
            Err(e) => { warn!(error = %e, "retrieval unavailable"); return Vec::new(); }
        };
        let hits = snap.rank(&query, direction, k);
        debug!(direction = %direction, k, hits = hits.len(), "examples retrieved");
        hits
    }
}

/// Distinct non-blank `(example_id, tabasaran, russian)` triples in entry id order.
fn collect_pairs(entries: &[DictionaryEntry]) -> Vec<(String, String, String)> {
    let mut ordered: Vec<&DictionaryEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| e.id);
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for entry in ordered {
        for (i, ex) in entry.examples.iter().enumerate() {
            let (tab, rus) = (ex.source_text.trim(), ex.target_text.trim());
            if tab.is_empty() || rus.is_empty() { continue; }
            if seen.insert((tab.to_string(), rus.to_string())) { out.push((format!("{}:{}", entry.id, i), tab.to_string(), rus.to_string())); }
        }
    }
    out
}
