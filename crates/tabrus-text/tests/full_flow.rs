use tabrus_core::types::DictionaryEntry;
use tabrus_text::TranslationIndex;

fn entry(id: u64, word: &str, translations: &[&str]) -> DictionaryEntry {
    DictionaryEntry {
        id,
        word: word.to_string(),
        word_normalized: word.to_lowercase(),
        root: None,
        part_of_speech: None,
        translations: translations.iter().map(|s| s.to_string()).collect(),
        examples: vec![],
        is_verified: false,
    }
}

fn sample() -> Vec<DictionaryEntry> {
    vec![
        entry(1, "хал", &["дом", "жилище"]),
        entry(2, "баба", &["мать"]),
        entry(3, "хулар", &["дома", "дом (мн.)"]),
        entry(4, "чвас", &["здесь"]),
    ]
}

#[test]
fn finds_entries_by_stemmed_translation() {
    let index = TranslationIndex::build(&sample()).expect("build");
    let hits = index.search("домов", 10).expect("search");
    let ids: Vec<u64> = hits.iter().map(|h| h.entry_id).collect();
    assert!(ids.contains(&1), "stem of 'домов' matches 'дом'");
    assert!(ids.contains(&3));
    assert!(!ids.contains(&2));
    // one hit per entry even though entry 3 has two matching senses
    assert_eq!(ids.iter().filter(|&&i| i == 3).count(), 1);
    for w in hits.windows(2) { assert!(w[0].score >= w[1].score); }
}

#[test]
fn search_is_case_insensitive_and_limited() {
    let index = TranslationIndex::build(&sample()).expect("build");
    let hits = index.search("ЗДЕСЬ", 10).expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entry_id, 4);
    assert_eq!(index.search("дом", 1).expect("search").len(), 1);
}

#[test]
fn malformed_or_empty_queries_do_not_fail() {
    let index = TranslationIndex::build(&sample()).expect("build");
    assert!(index.search("", 5).expect("empty").is_empty());
    assert!(index.search("мать)(", 5).is_ok());
    assert!(index.search("несуществующее", 5).expect("miss").is_empty());
}

#[test]
fn huge_limit_returns_every_match() {
    let index = TranslationIndex::build(&sample()).expect("build");
    assert_eq!(index.senses(), 6);
    let hits = index.search("дом", usize::MAX / 2).expect("search");
    let mut ids: Vec<u64> = hits.iter().map(|h| h.entry_id).collect();
    ids.sort();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(index.search("мать", usize::MAX).expect("search").len(), 1);
}

#[test]
fn empty_index_searches_to_nothing() {
    let index = TranslationIndex::build(&[]).expect("build");
    assert!(index.search("дом", 10).expect("search").is_empty());
}
