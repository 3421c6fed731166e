use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tabrus_core::traits::Embedder;
use tabrus_core::types::{DictionaryEntry, Direction, Example};
use tabrus_embed::HashingEmbedder;
use tabrus_vector::ExampleRetriever;

/// Hashing embedder that counts how many texts it was asked to embed.
struct Counting { inner: HashingEmbedder, calls: AtomicUsize }

impl Embedder for Counting {
    fn id(&self) -> &str { self.inner.id() }
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts)
    }
}

struct Broken;

impl Embedder for Broken {
    fn id(&self) -> &str { "broken" }
    fn dim(&self) -> usize { 8 }
    fn max_len(&self) -> usize { 8 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { anyhow::bail!("model offline") }
}

fn entry(id: u64, examples: &[(&str, &str)]) -> DictionaryEntry {
    DictionaryEntry {
        id,
        word: format!("w{}", id),
        word_normalized: String::new(),
        root: None,
        part_of_speech: None,
        translations: vec!["t".to_string()],
        examples: examples.iter().map(|(s, t)| Example { source_text: s.to_string(), target_text: t.to_string(), provenance: None }).collect(),
        is_verified: true,
    }
}

fn corpus() -> Vec<DictionaryEntry> {
    vec![
        entry(1, &[("Узу чвас ава", "Я здесь"), ("Баба хулаз гъушну", "Мать пошла домой")]),
        entry(2, &[("Гъвелчи хулаз гъафну", "Друг пришёл домой")]),
        entry(3, &[("Дада гъахъну", "Отец вырос"), ("", "пусто")]),
    ]
}

#[test]
fn retrieves_most_similar_first() {
    let r = ExampleRetriever::new(Arc::new(HashingEmbedder::new(512)));
    let stats = r.index(&corpus()).expect("index");
    assert_eq!(stats.examples, 4);
    assert_eq!(r.len(), 4);

    let hits = r.retrieve("гъвелчи хулаз", Direction::TabRus, 2);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0], ("Гъвелчи хулаз гъафну".to_string(), "Друг пришёл домой".to_string()));

    // reverse direction is keyed by the Russian side
    let hits = r.retrieve("Я здесь", Direction::RusTab, 1);
    assert_eq!(hits, vec![("Я здесь".to_string(), "Узу чвас ава".to_string())]);
}

#[test]
fn fewer_than_k_when_index_is_small() {
    let r = ExampleRetriever::new(Arc::new(HashingEmbedder::new(64)));
    r.index(&corpus()).expect("index");
    assert_eq!(r.retrieve("чвас", Direction::TabRus, 50).len(), 4);
    assert!(r.retrieve("чвас", Direction::TabRus, 0).is_empty());
}

#[test]
fn empty_or_broken_index_returns_nothing() {
    let r = ExampleRetriever::new(Arc::new(HashingEmbedder::new(64)));
    assert!(r.retrieve("чвас", Direction::TabRus, 3).is_empty());
    assert!(r.status().built_at.is_none());

    let broken = ExampleRetriever::new(Arc::new(Broken));
    assert!(broken.index(&corpus()).is_err());
    assert!(broken.is_empty());
    assert!(broken.retrieve("чвас", Direction::TabRus, 3).is_empty());
}

#[test]
fn reindex_is_full_replace_and_reuses_cache() {
    let embedder = Arc::new(Counting { inner: HashingEmbedder::new(128), calls: AtomicUsize::new(0) });
    let r = ExampleRetriever::new(embedder.clone());
    let first = r.index(&corpus()).expect("index");
    assert_eq!(first.embedded, 8);
    assert_eq!(first.cached, 0);
    assert_eq!(r.cached_embeddings(), 8);
    let before = r.snapshot();

    // drop entry 1, keep the rest: nothing new to embed
    let next: Vec<DictionaryEntry> = corpus().into_iter().filter(|e| e.id != 1).collect();
    let second = r.index(&next).expect("reindex");
    assert_eq!(second, tabrus_vector::IndexStats { examples: 2, embedded: 0, cached: 4 });
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 8);
    // vectors of the dropped examples are evicted with the old snapshot
    assert_eq!(r.cached_embeddings(), 4);
    assert!(r.retrieve("Узу чвас ава", Direction::TabRus, 5).iter().all(|(s, _)| s != "Узу чвас ава"));

    // readers holding the old snapshot are unaffected
    assert_eq!(before.len(), 4);
    assert!(r.status().built_at.is_some());

    // bringing entry 1 back embeds its sentences again
    let third = r.index(&corpus()).expect("reindex");
    assert_eq!(third, tabrus_vector::IndexStats { examples: 4, embedded: 4, cached: 4 });
    assert_eq!(r.cached_embeddings(), 8);
}

#[test]
fn duplicate_examples_are_indexed_once() {
    let r = ExampleRetriever::new(Arc::new(HashingEmbedder::new(64)));
    let entries = vec![entry(1, &[("Узу чвас ава", "Я здесь")]), entry(2, &[("Узу чвас ава", "Я здесь")])];
    assert_eq!(r.index(&entries).expect("index").examples, 1);
    assert_eq!(r.snapshot().examples(Direction::TabRus)[0].example_id, "1:0");
}
