use tabrus_core::config::{AffixRules, MorphologySettings};
use tabrus_core::types::Direction;
use tracing::trace;

/// Dictionary key form of a word: trimmed and lowercased.
pub fn normalize_key(word: &str) -> String { word.trim().to_lowercase() }

fn is_cyrillic(c: char) -> bool { ('\u{0400}'..='\u{04FF}').contains(&c) }

/// Orthographic folding on top of [`normalize_key`].
///
/// The palochka is routinely typed as Latin `I`/`l` or digit `1`; those are
/// folded to `ӏ` only inside words that already contain Cyrillic letters.
/// `ё` folds to `е`.
pub fn fold(word: &str) -> String {
    let word = word.trim();
    let cyrillic = word.chars().any(is_cyrillic);
    word.chars()
        .map(|c| match c {
            'I' | 'l' | '1' if cyrillic => 'ӏ',
            'Ӏ' => 'ӏ',
            other => other,
        })
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ё' { 'е' } else { c })
        .collect()
}

fn char_len(s: &str) -> usize { s.chars().count() }

fn push_unique(out: &mut Vec<String>, form: &str) {
    if !form.is_empty() && !out.iter().any(|c| c == form) { out.push(form.to_string()); }
}

struct AffixSet {
    suffixes: Vec<String>,
    prefixes: Vec<String>,
    min_stem_chars: usize,
}

impl AffixSet {
    fn new(rules: &AffixRules) -> Self {
        let sorted = |affixes: &[String]| {
            let mut v: Vec<String> = affixes.iter().map(|a| normalize_key(a)).filter(|a| !a.is_empty()).collect();
            // longest first; ties alphabetical so the order never depends on config layout
            v.sort_by(|a, b| char_len(b).cmp(&char_len(a)).then_with(|| a.cmp(b)));
            v.dedup();
            v
        };
        Self { suffixes: sorted(&rules.suffixes), prefixes: sorted(&rules.prefixes), min_stem_chars: rules.min_stem_chars.max(1) }
    }

    fn strip_suffix<'s>(&self, stem: &'s str) -> Option<&'s str> {
        let len = char_len(stem);
        self.suffixes
            .iter()
            .find(|s| stem.ends_with(s.as_str()) && len - char_len(s) >= self.min_stem_chars)
            .map(|s| &stem[..stem.len() - s.len()])
    }

    fn strip_prefix<'s>(&self, stem: &'s str) -> Option<&'s str> {
        let len = char_len(stem);
        self.prefixes
            .iter()
            .find(|p| stem.starts_with(p.as_str()) && len - char_len(p) >= self.min_stem_chars)
            .map(|p| &stem[p.len()..])
    }
}

/// Heuristic affix stripper producing ranked lookup candidates.
///
/// Not a parser: competing analyses are not disambiguated, the first
/// candidate that hits the dictionary wins.
pub struct MorphNormalizer {
    tab: AffixSet,
    rus: AffixSet,
}

impl MorphNormalizer {
    pub fn new(settings: &MorphologySettings) -> Self { Self { tab: AffixSet::new(&settings.tab), rus: AffixSet::new(&settings.rus) } }

    fn rules(&self, direction: Direction) -> &AffixSet {
        match direction {
            Direction::TabRus => &self.tab,
            Direction::RusTab => &self.rus,
        }
    }

    /// Candidate keys for `word` in the source language of `direction`.
    ///
    /// `[0]` is always the verbatim lowercase form. Then the folded form (if
    /// it differs), then every intermediate stem of repeated longest-suffix
    /// stripping, and finally the last stem with a known prefix removed.
    /// No duplicates.
    pub fn candidates(&self, word: &str, direction: Direction) -> Vec<String> {
        let rules = self.rules(direction);
        let mut out = vec![normalize_key(word)];

        let folded = fold(word);
        push_unique(&mut out, &folded);

        let mut stem = folded.as_str();
        while let Some(shorter) = rules.strip_suffix(stem) {
            push_unique(&mut out, shorter);
            stem = shorter;
        }
        if let Some(bare) = rules.strip_prefix(stem) { push_unique(&mut out, bare); }

        trace!(word, %direction, candidates = ?out, "morph candidates");
        out
    }
}
