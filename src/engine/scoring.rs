// ── Bridge Engine: Importance & Relevance Scoring ──────────────────────────
//
// Importance is content-derived and fixed at creation:
//   1.0 base + chars/100 + 2.0 (intense emotion) + 1.5 (important intent)
//   + 5.0 (marker name), capped at 10.0.
//
// Relevance is the Jaccard index of query and fragment token sets.
// Retrieval ranks by relevance × importance.

use crate::atoms::constants::{
    HIGH_INTENSITY_EMOTIONS, IMPORTANCE_BASE, IMPORTANCE_EMOTION_BONUS, IMPORTANCE_INTENT_BONUS,
    IMPORTANCE_LENGTH_DIVISOR, IMPORTANCE_MARKER_BONUS, IMPORTANCE_MAX, IMPORTANT_INTENTS,
    MARKER_NAMES,
};
use std::collections::HashSet;

/// True if `haystack` contains any of `needles`, case-insensitively.
fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lowered = haystack.to_lowercase();
    needles.iter().any(|n| lowered.contains(n))
}

/// Whether content mentions a marker name.
pub fn is_flagged(content: &str) -> bool {
    contains_any(content, &MARKER_NAMES)
}

/// Relevance-independent priority of a fragment, in [1.0, 10.0].
pub fn importance_score(content: &str, emotion: Option<&str>, intent: Option<&str>) -> f64 {
    let mut score = IMPORTANCE_BASE;

    score += content.chars().count() as f64 / IMPORTANCE_LENGTH_DIVISOR;

    if emotion.is_some_and(|e| contains_any(e, &HIGH_INTENSITY_EMOTIONS)) {
        score += IMPORTANCE_EMOTION_BONUS;
    }

    if intent.is_some_and(|i| contains_any(i, &IMPORTANT_INTENTS)) {
        score += IMPORTANCE_INTENT_BONUS;
    }

    if is_flagged(content) {
        score += IMPORTANCE_MARKER_BONUS;
    }

    score.min(IMPORTANCE_MAX)
}

/// Jaccard similarity of two token sequences, in [0.0, 1.0].
///
/// Duplicates are ignored. Returns 0.0 when either side is empty.
pub fn relevance<S: AsRef<str>>(query_tokens: &[S], fragment_tokens: &[S]) -> f64 {
    if query_tokens.is_empty() || fragment_tokens.is_empty() {
        return 0.0;
    }
    let q: HashSet<&str> = query_tokens.iter().map(AsRef::as_ref).collect();
    let f: HashSet<&str> = fragment_tokens.iter().map(AsRef::as_ref).collect();
    let intersection = q.intersection(&f).count();
    let union = q.union(&f).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        crate::engine::tokenizer::tokenize(s)
    }

    #[test]
    fn empty_content_scores_base() {
        assert_eq!(importance_score("", None, None), 1.0);
    }

    #[test]
    fn length_counts_code_points_not_bytes() {
        // 50 two-byte chars → +0.5
        let text = "ä".repeat(50);
        assert!((importance_score(&text, None, None) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn emotion_bonus_is_case_insensitive_substring() {
        let s = importance_score("x", Some("Excitement+LOVE"), None);
        assert!((s - (1.0 + 0.01 + 2.0)).abs() < 1e-9, "got {s}");
        let plain = importance_score("x", Some("calm"), None);
        assert!((plain - 1.01).abs() < 1e-9);
    }

    #[test]
    fn intent_bonus_matches_bridge_variants() {
        let s = importance_score("x", None, Some("bridge_to_wes"));
        assert!((s - 2.51).abs() < 1e-9, "got {s}");
        assert!((importance_score("x", None, Some("documentation")) - 1.01).abs() < 1e-9);
    }

    #[test]
    fn marker_name_adds_five() {
        let s = importance_score("Gabriel", None, None);
        assert!((s - (1.0 + 0.07 + 5.0)).abs() < 1e-9, "got {s}");
        assert!(s >= 6.0);
    }

    #[test]
    fn score_is_capped_at_ten() {
        let long = format!("gabriela {}", "a".repeat(5_000));
        assert_eq!(importance_score(&long, Some("liebe"), Some("memory_store")), 10.0);
    }

    #[test]
    fn flagging_is_case_insensitive() {
        assert!(is_flagged("thanks GABRIELA"));
        assert!(is_flagged("archangel gabriel"));
        assert!(!is_flagged("gabe"));
    }

    #[test]
    fn relevance_of_identical_sets_is_one() {
        let a = toks("rust memory bridge");
        assert_eq!(relevance(&a, &a), 1.0);
    }

    #[test]
    fn relevance_with_empty_side_is_zero() {
        let a = toks("rust");
        let empty: Vec<String> = Vec::new();
        assert_eq!(relevance(&empty, &a), 0.0);
        assert_eq!(relevance(&a, &empty), 0.0);
    }

    #[test]
    fn relevance_ignores_duplicates() {
        // {gabriela, bridge} vs {gabriela, built, the, bridge} → 2/4
        let q = toks("Gabriela bridge bridge");
        let f = toks("Gabriela built the bridge");
        assert!((relevance(&q, &f) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn disjoint_sets_have_zero_relevance() {
        assert_eq!(relevance(&toks("gabriela bridge"), &toks("the weather is nice")), 0.0);
    }
}
