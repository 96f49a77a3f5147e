//! # Similarity Scorer Module
//!
//! Bounded string similarity built on Levenshtein edit distance, with a bonus
//! when one string contains the other. Inputs are expected to be normalized
//! already; lengths and distances are counted in characters.
//!
//! Score for distinct, non-empty `a` and `b`:
//!
//! ```text
//! base  = 1 - levenshtein(a, b) / max(len a, len b)
//! bonus = 0.1 + (min(len a, len b) / max(len a, len b)) * 0.1   (only on containment)
//! score = clamp(base + bonus, 0, 1)
//! ```
//!
//! Matching floors elsewhere in the crate are tuned against this exact formula.

use strsim::levenshtein;

/// Compute the similarity between two normalized strings (0.0 to 1.0)
///
/// # Examples
///
/// ```rust
/// use meal_nutrition::similarity::similarity;
///
/// assert_eq!(similarity("ご飯", "ご飯"), 1.0);
/// assert_eq!(similarity("ご飯", ""), 0.0);
/// assert!(similarity("ご飯", "ご飯大盛り") > similarity("ご飯", "パン"));
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let longest = len_a.max(len_b) as f64;
    let shortest = len_a.min(len_b) as f64;

    let distance = levenshtein(a, b) as f64;
    let mut score = 1.0 - distance / longest;

    if a.contains(b) || b.contains(a) {
        score += 0.1 + (shortest / longest) * 0.1;
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &["ご飯", "ご飯大盛り", "味噌汁", "みそ汁", "rice", "ricecake", "x", ""];

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_identity_and_empty() {
        for s in SAMPLES.iter().filter(|s| !s.is_empty()) {
            assert_eq!(similarity(s, s), 1.0);
            assert_eq!(similarity(s, ""), 0.0);
            assert_eq!(similarity("", s), 0.0);
        }
        assert_eq!(similarity("", ""), 0.0);
    }

    #[test]
    fn test_symmetric_and_bounded() {
        for a in SAMPLES {
            for b in SAMPLES {
                let ab = similarity(a, b);
                assert_eq!(ab, similarity(b, a), "asymmetric for {a:?}/{b:?}");
                assert!((0.0..=1.0).contains(&ab), "out of bounds for {a:?}/{b:?}");
            }
        }
    }

    #[test]
    fn test_plain_edit_distance() {
        // Two substitutions out of three characters, no containment
        assert!(approx_eq(similarity("味噌汁", "みそ汁"), 1.0 - 2.0 / 3.0));
        assert!(approx_eq(similarity("abc", "abd"), 1.0 - 1.0 / 3.0));
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_containment_bonus() {
        // "rice" in "ricecake": distance 4, base 0.5, bonus 0.1 + 0.5 * 0.1
        assert!(approx_eq(similarity("rice", "ricecake"), 0.5 + 0.15));
        // "ご飯" in "ご飯大盛り": distance 3, base 0.4, bonus 0.1 + 0.4 * 0.1
        assert!(approx_eq(similarity("ご飯", "ご飯大盛り"), 0.4 + 0.14));
    }

    #[test]
    fn test_bonus_clamped() {
        // distance 1 over 10 chars gives base 0.9, bonus 0.19, clamped to 1
        assert_eq!(similarity("abcdefghij", "abcdefghi"), 1.0);
    }
}
