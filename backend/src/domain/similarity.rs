//! Bigram string similarity.
//!
//! Dice coefficient over *sets* of character bigrams: duplicate bigrams
//! within one string collapse before counting. This differs from the
//! classic multiset Dice and the difference is intentional - resolution
//! behavior depends on these exact scores.

use std::collections::HashSet;

fn bigrams(s: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Similarity score in [0, 1]. Equal strings score 1, either empty
/// scores 0, and the measure is symmetric.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let bigrams_a = bigrams(a);
    let bigrams_b = bigrams(b);
    let denominator = bigrams_a.len() + bigrams_b.len();
    if denominator == 0 {
        // Two distinct single-character strings have no bigrams at all
        return 0.0;
    }

    let intersection = bigrams_a.intersection(&bigrams_b).count();
    (2 * intersection) as f64 / denominator as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_strings_score_one() {
        assert_eq!(similarity("גן השקד", "גן השקד"), 1.0);
        assert_eq!(similarity("a", "a"), 1.0);
    }

    #[test]
    fn empty_scores_zero() {
        assert_eq!(similarity("גן השקד", ""), 0.0);
        assert_eq!(similarity("", "גן השקד"), 0.0);
        assert_eq!(similarity("", ""), 0.0);
    }

    #[test]
    fn distinct_single_chars_score_zero() {
        assert_eq!(similarity("a", "b"), 0.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [
            ("גן השקד", "גן השקט"),
            ("הגדולה", "הקטנה"),
            ("playground", "play ground"),
            ("abc", "xyz"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn near_duplicate_hebrew_names_score_high() {
        // One letter apart: 5 shared bigrams out of 6 + 6
        let score = similarity("גן השקד", "גן השקט");
        assert!(score >= 0.8, "score was {}", score);
    }

    #[test]
    fn unrelated_names_score_low() {
        let score = similarity("גן השקד", "פארק הירקון");
        assert!(score < 0.8, "score was {}", score);
    }

    #[test]
    fn duplicate_bigrams_collapse() {
        // "aaaa" has the single bigram set {aa}; "aa" likewise.
        // Set semantics give 2*1/(1+1) = 1 even though the multiset
        // counts differ.
        assert_eq!(similarity("aaaa", "aa"), 1.0);
    }
}
