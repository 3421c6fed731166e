use std::collections::{HashMap, HashSet};

/// Symmetric-delete index over a fixed key set.
///
/// Every key is expanded into all strings reachable by deleting up to
/// `max_distance` characters. A query is expanded the same way; keys sharing
/// a variant with the query are the only ones that can be within
/// `max_distance`, and are then checked with a bounded Levenshtein distance.
/// Lookup cost depends on the query length, not on the number of keys.
pub struct FuzzyIndex {
    keys: Vec<String>,
    deletes: HashMap<String, Vec<u32>>,
    max_distance: usize,
}

impl FuzzyIndex {
    pub fn build<'k, I>(keys: I, max_distance: usize) -> Self
    where
        I: IntoIterator<Item = &'k str>,
    {
        let keys: Vec<String> = keys.into_iter().map(str::to_string).collect();
        let mut deletes: HashMap<String, Vec<u32>> = HashMap::new();
        for (idx, key) in keys.iter().enumerate() {
            for variant in delete_variants(key, max_distance) {
                deletes.entry(variant).or_default().push(idx as u32);
            }
        }
        Self { keys, deletes, max_distance }
    }

    pub fn max_distance(&self) -> usize { self.max_distance }

    /// Keys within `max_distance` edits of `query`, nearest first, ties alphabetical.
    ///
    /// Distances beyond what the index was built for fall back to a scan.
    pub fn search(&self, query: &str, max_distance: usize) -> Vec<(&str, usize)> {
        let needle: Vec<char> = query.chars().collect();
        let mut candidates: HashSet<u32> = HashSet::new();
        if max_distance <= self.max_distance {
            for variant in delete_variants(query, max_distance) {
                if let Some(ids) = self.deletes.get(&variant) { candidates.extend(ids.iter().copied()); }
            }
        } else {
            candidates.extend(0..self.keys.len() as u32);
        }

        let mut out: Vec<(&str, usize)> = candidates
            .into_iter()
            .filter_map(|idx| {
                let key = self.keys[idx as usize].as_str();
                let d = levenshtein_with_max(key, &needle, max_distance);
                (d <= max_distance).then_some((key, d))
            })
            .collect();
        out.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        out
    }
}

/// All distinct strings obtained from `word` by deleting up to `max_distance`
/// characters, including `word` itself. Works on chars, not bytes.
fn delete_variants(word: &str, max_distance: usize) -> HashSet<String> {
    let mut edits = HashSet::new();
    edits.insert(word.to_string());
    let mut frontier: Vec<Vec<char>> = vec![word.chars().collect()];
    for _ in 0..max_distance {
        let mut next = Vec::new();
        for chars in &frontier {
            for i in 0..chars.len() {
                let mut variant = chars.clone();
                variant.remove(i);
                if edits.insert(variant.iter().collect()) { next.push(variant); }
            }
        }
        frontier = next;
    }
    edits
}

/// Levenshtein distance between `value` and `needle`, returning `max_dist + 1`
/// as soon as every cell of a row exceeds `max_dist`.
pub fn levenshtein_with_max(value: &str, needle: &[char], max_dist: usize) -> usize {
    let n = needle.len();
    let value_len = value.chars().count();
    if value_len.abs_diff(n) > max_dist { return max_dist + 1; }
    if n == 0 { return value_len; }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];
    for (i, c) in value.chars().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for j in 1..=n {
            let cost = usize::from(c != needle[j - 1]);
            let d = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            curr[j] = d;
            row_min = row_min.min(d);
        }
        if row_min > max_dist { return max_dist + 1; }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lev(a: &str, b: &str) -> usize {
        let b: Vec<char> = b.chars().collect();
        levenshtein_with_max(a, &b, 10)
    }

    #[test]
    fn levenshtein_on_cyrillic() {
        assert_eq!(lev("салам", "салам"), 0);
        assert_eq!(lev("салам", "салом"), 1);
        assert_eq!(lev("гъвелчи", "гвелчи"), 1);
        assert_eq!(lev("баба", "дада"), 2);
        assert_eq!(lev("", "чвас"), 4);
    }

    #[test]
    fn bounded_distance_exits_early() {
        let needle: Vec<char> = "абвгд".chars().collect();
        assert_eq!(levenshtein_with_max("ежзик", &needle, 2), 3);
    }

    #[test]
    fn delete_index_matches_scan() {
        let keys = ["салам", "чвас", "баба", "дада", "гъвелчи", "хал"];
        let index = FuzzyIndex::build(keys.iter().copied(), 2);
        for query in ["салом", "чвaс", "бабa", "гвелчи", "хала", "ххх"] {
            let fast = index.search(query, 2);
            let scan = index.search(query, 3).into_iter().filter(|(_, d)| *d <= 2).collect::<Vec<_>>();
            assert_eq!(fast, scan, "query {}", query);
        }
        assert_eq!(index.search("салом", 1), vec![("салам", 1)]);
    }
}
