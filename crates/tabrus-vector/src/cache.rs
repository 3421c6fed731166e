use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Hex blake3 digest of a sentence; the cache key together with the embedder id.
pub fn content_hash(text: &str) -> String { blake3::hash(text.as_bytes()).to_hex().to_string() }

/// In-process embedding cache keyed by `(content_hash, embedder_id)`.
///
/// Consulted before the embedder on every re-index and written through on
/// misses, so a full rebuild only embeds sentences it has not seen. After a
/// rebuild only the live snapshot's sentences are kept.
#[derive(Default)]
pub struct EmbeddingCache {
    entries: Mutex<HashMap<(String, String), Vec<f32>>>,
}

impl EmbeddingCache {
    pub fn new() -> Self { Self::default() }

    /// Cached vectors for whichever of `hashes` are present.
    pub fn get_many(&self, embedder_id: &str, hashes: &[String]) -> HashMap<String, Vec<f32>> {
        let Ok(entries) = self.entries.lock() else { return HashMap::new() };
        hashes
            .iter()
            .filter_map(|h| entries.get(&(h.clone(), embedder_id.to_string())).map(|v| (h.clone(), v.clone())))
            .collect()
    }

    pub fn put_many(&self, embedder_id: &str, items: impl IntoIterator<Item = (String, Vec<f32>)>) {
        let Ok(mut entries) = self.entries.lock() else { return };
        for (hash, vector) in items { entries.insert((hash, embedder_id.to_string()), vector); }
    }

    /// Drop every vector except those for `keep` under `embedder_id`.
    pub fn retain(&self, embedder_id: &str, keep: &HashSet<String>) {
        let Ok(mut entries) = self.entries.lock() else { return };
        entries.retain(|(hash, eid), _| eid == embedder_id && keep.contains(hash));
    }

    pub fn len(&self) -> usize { self.entries.lock().map(|e| e.len()).unwrap_or(0) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}
