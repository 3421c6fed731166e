use tracing::debug;

use tabrus_core::config::MatchingSettings;
use tabrus_core::types::{DictionaryEntry, Direction, WordTranslation};
use tabrus_dict::DictionaryIndex;
use tabrus_morph::MorphNormalizer;

use crate::confidence::{score, score_hundredths, MatchKind};

/// Resolve one word-token against `index`.
///
/// Priority: exact on the verbatim word, then exact on each normalized
/// candidate (most specific first), then fuzzy on the verbatim word. Fuzzy
/// matches scoring below `matching.fuzzy_min_confidence` count as unknown.
pub fn resolve_word(
    index: &DictionaryIndex,
    normalizer: &MorphNormalizer,
    word: &str,
    direction: Direction,
    matching: &MatchingSettings,
) -> (WordTranslation, Option<MatchKind>) {
    let candidates = normalizer.candidates(word, direction);

    for (rank, candidate) in candidates.iter().enumerate() {
        let hits = index.lookup_exact(candidate, direction);
        if hits.is_empty() { continue; }
        let kind = if rank == 0 { MatchKind::Exact } else { MatchKind::Normalized(rank - 1) };
        debug!(word, candidate = candidate.as_str(), ?kind, "dictionary hit");
        return (assemble(word, &hits, direction, kind), Some(kind));
    }

    let fuzzy = index.lookup_fuzzy(word, direction, matching.fuzzy_max_distance);
    if let Some(&(_, distance)) = fuzzy.first() {
        let kind = MatchKind::Fuzzy(distance);
        let floor = (matching.fuzzy_min_confidence * 100.0).round() as u32;
        if score_hundredths(kind, false) >= floor {
            let level: Vec<&DictionaryEntry> = fuzzy.iter().take_while(|(_, d)| *d == distance).map(|(e, _)| *e).collect();
            debug!(word, distance, "fuzzy hit");
            return (assemble(word, &level, direction, kind), Some(kind));
        }
        debug!(word, distance, "fuzzy hit below confidence floor");
    }

    debug!(word, "unknown word");
    (WordTranslation::unknown(word), None)
}

/// Build the per-word result from the ranked entries of the winning level.
fn assemble(word: &str, entries: &[&DictionaryEntry], direction: Direction, kind: MatchKind) -> WordTranslation {
    let Some(first) = entries.first().copied() else { return WordTranslation::unknown(word) };
    let translations = match direction {
        Direction::TabRus => first.translations.clone(),
        Direction::RusTab => {
            let mut heads: Vec<String> = Vec::new();
            for e in entries {
                if !heads.contains(&e.word) { heads.push(e.word.clone()); }
            }
            heads
        }
    };
    WordTranslation {
        word: word.to_string(),
        translations,
        part_of_speech: first.part_of_speech.clone(),
        confidence: score(kind, first.is_verified),
        is_unknown: false,
    }
}
