use serde::Serialize;

/// How a word reached its dictionary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchKind {
    /// The verbatim lowercase word is a key.
    Exact,
    /// A normalized candidate is a key; the value is its zero-based rank
    /// among the normalized candidates.
    Normalized(usize),
    /// Nearest key within the fuzzy threshold; the value is the edit distance.
    Fuzzy(usize),
}

/// Score in hundredths, so thresholds compare exactly.
pub fn score_hundredths(kind: MatchKind, is_verified: bool) -> u32 {
    match kind {
        MatchKind::Exact if is_verified => 100,
        MatchKind::Exact => 90,
        MatchKind::Normalized(steps) => 75u32.saturating_sub(5u32.saturating_mul(steps as u32)).max(50),
        MatchKind::Fuzzy(distance) => 50u32.saturating_sub(10u32.saturating_mul(distance as u32)).max(20),
    }
}

pub fn score(kind: MatchKind, is_verified: bool) -> f32 { score_hundredths(kind, is_verified) as f32 / 100.0 }

/// Display band used by the frontend's colour coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand { High, Medium, Low }

pub fn band(confidence: f32) -> ConfidenceBand {
    let h = (confidence * 100.0).round() as i64;
    if h >= 80 { ConfidenceBand::High } else if h >= 50 { ConfidenceBand::Medium } else { ConfidenceBand::Low }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_follow_match_quality() {
        assert_eq!(score(MatchKind::Exact, true), 1.0);
        assert_eq!(score(MatchKind::Exact, false), 0.9);
        assert_eq!(score(MatchKind::Normalized(0), true), 0.75);
        assert_eq!(score(MatchKind::Normalized(1), false), 0.7);
        assert_eq!(score(MatchKind::Normalized(5), false), 0.5);
        assert_eq!(score(MatchKind::Normalized(40), false), 0.5);
        assert_eq!(score(MatchKind::Fuzzy(1), true), 0.4);
        assert_eq!(score(MatchKind::Fuzzy(2), true), 0.3);
        assert_eq!(score(MatchKind::Fuzzy(9), true), 0.2);
    }

    #[test]
    fn ordering_is_preserved() {
        let kinds = [MatchKind::Exact, MatchKind::Normalized(0), MatchKind::Normalized(9), MatchKind::Fuzzy(0), MatchKind::Fuzzy(9)];
        for pair in kinds.windows(2) { assert!(score_hundredths(pair[0], false) >= score_hundredths(pair[1], true)); }
    }

    #[test]
    fn bands() {
        assert_eq!(band(1.0), ConfidenceBand::High);
        assert_eq!(band(0.8), ConfidenceBand::High);
        assert_eq!(band(0.75), ConfidenceBand::Medium);
        assert_eq!(band(0.5), ConfidenceBand::Medium);
        assert_eq!(band(0.4), ConfidenceBand::Low);
        assert_eq!(band(0.0), ConfidenceBand::Low);
    }
}
