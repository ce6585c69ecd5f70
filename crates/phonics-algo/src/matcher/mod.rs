//! Fuzzy pronunciation matching.
//!
//! Compares speech-recognizer output against a target word or sentence.
//! Child speech drops consonants, stretches vowels and substitutes
//! sounds, so the thresholds here are deliberately loose: a near miss
//! should pass, only a clearly different utterance should fail.

use serde::{Deserialize, Serialize};

/// Composite similarity threshold below which a single-word utterance is
/// rejected.
const MATCH_THRESHOLD: f64 = 0.55;

/// Minimum per-word similarity for a target word to count as covered in a
/// multi-word target.
const WORD_SIMILARITY_FLOOR: f64 = 0.55;

/// Fraction of target words that must be covered for a multi-word match.
const WORD_COVERAGE_RATIO: f64 = 0.6;

/// Confidence assigned to a substring containment match.
const CONTAINMENT_CONFIDENCE: f64 = 0.8;

const VOWELS: [char; 5] = ['a', 'e', 'i', 'o', 'u'];

/// Result of comparing recognized speech against a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub matched: bool,
    pub confidence: f64,
}

impl MatchOutcome {
    fn miss(confidence: f64) -> Self {
        Self {
            matched: false,
            confidence,
        }
    }

    fn hit(confidence: f64) -> Self {
        Self {
            matched: true,
            confidence,
        }
    }
}

/// Lowercase, strip punctuation, collapse runs of whitespace.
pub fn normalize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = true;
    for ch in input.chars() {
        if ch.is_alphanumeric() || ch == '\'' {
            for lower in ch.to_lowercase() {
                if lower != '\'' {
                    out.push(lower);
                }
            }
            last_was_space = false;
        } else if ch.is_whitespace() && !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Compare recognized speech against the target text.
pub fn match_pronunciation(recognized: &str, target: &str) -> MatchOutcome {
    let recognized = normalize_text(recognized);
    let target = normalize_text(target);

    if recognized.is_empty() || target.is_empty() {
        return MatchOutcome::miss(0.0);
    }

    if recognized == target {
        return MatchOutcome::hit(1.0);
    }

    if recognized.contains(&target) || target.contains(&recognized) {
        return MatchOutcome::hit(CONTAINMENT_CONFIDENCE);
    }

    let target_words: Vec<&str> = target.split(' ').collect();
    if target_words.len() > 1 {
        let recognized_words: Vec<&str> = recognized.split(' ').collect();
        let covered = target_words
            .iter()
            .filter(|tw| {
                recognized_words
                    .iter()
                    .map(|rw| word_similarity(rw, tw))
                    .fold(0.0f64, f64::max)
                    >= WORD_SIMILARITY_FLOOR
            })
            .count();
        let ratio = covered as f64 / target_words.len() as f64;
        if ratio >= WORD_COVERAGE_RATIO {
            return MatchOutcome::hit(ratio);
        }
        return MatchOutcome::miss(ratio);
    }

    let similarity = word_similarity(&recognized, &target);
    if similarity >= MATCH_THRESHOLD {
        MatchOutcome::hit(similarity)
    } else {
        MatchOutcome::miss(similarity)
    }
}

/// Composite single-word similarity in 0..1.
///
/// Weighted blend of length ratio, first-letter agreement, character-set
/// overlap and vowel-sequence similarity. Vowel runs are collapsed first
/// so stretched vowels ("caaaat") score like the plain word.
fn word_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let length_ratio = {
        let (shorter, longer) = if a.len() <= b.len() {
            (a.len(), b.len())
        } else {
            (b.len(), a.len())
        };
        shorter as f64 / longer as f64
    };

    let first_letter = match (a.chars().next(), b.chars().next()) {
        (Some(x), Some(y)) if x == y => 1.0,
        _ => 0.0,
    };

    let charset_overlap = charset_jaccard(a, b);
    let vowel_score = vowel_sequence_similarity(a, b);

    0.25 * length_ratio + 0.15 * first_letter + 0.30 * charset_overlap + 0.30 * vowel_score
}

fn charset_jaccard(a: &str, b: &str) -> f64 {
    let set_a: std::collections::BTreeSet<char> = a.chars().collect();
    let set_b: std::collections::BTreeSet<char> = b.chars().collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Positional similarity of the two vowel sequences with runs collapsed.
fn vowel_sequence_similarity(a: &str, b: &str) -> f64 {
    let va = collapsed_vowels(a);
    let vb = collapsed_vowels(b);
    if va.is_empty() && vb.is_empty() {
        return 1.0;
    }
    if va.is_empty() || vb.is_empty() {
        return 0.0;
    }
    let longest = va.len().max(vb.len());
    let matching = va
        .chars()
        .zip(vb.chars())
        .filter(|(x, y)| x == y)
        .count();
    matching as f64 / longest as f64
}

fn collapsed_vowels(word: &str) -> String {
    let mut out = String::new();
    for ch in word.chars() {
        if VOWELS.contains(&ch) && out.chars().last() != Some(ch) {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(normalize_text("  The Cat,  sat!  "), "the cat sat");
        assert_eq!(normalize_text("don't"), "dont");
    }

    #[test]
    fn test_reflexive_exact_match() {
        let outcome = match_pronunciation("ship", "ship");
        assert!(outcome.matched);
        assert_eq!(outcome.confidence, 1.0);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let outcome = match_pronunciation("The cat!", "the cat");
        assert!(outcome.matched);
        assert_eq!(outcome.confidence, 1.0);
    }

    #[test]
    fn test_containment_either_direction() {
        let outcome = match_pronunciation("a big cat", "cat");
        assert!(outcome.matched);
        assert_eq!(outcome.confidence, CONTAINMENT_CONFIDENCE);

        let outcome = match_pronunciation("ca", "cat");
        assert!(outcome.matched);
        assert!(outcome.confidence > 0.0);
        assert!(outcome.confidence < 1.0);
    }

    #[test]
    fn test_vowel_stretch_tolerance() {
        let outcome = match_pronunciation("caaaat", "cat");
        assert!(outcome.matched);
        assert!(outcome.confidence >= MATCH_THRESHOLD);
    }

    #[test]
    fn test_clearly_different_word_rejected() {
        let outcome = match_pronunciation("dog", "ship");
        assert!(!outcome.matched);
    }

    #[test]
    fn test_multi_word_partial_coverage() {
        // Two of three target words present (order scrambled so neither
        // string contains the other): coverage 2/3 passes the 60% bar.
        let outcome = match_pronunciation("sat cat", "the cat sat");
        assert!(outcome.matched);
        assert!(outcome.confidence >= WORD_COVERAGE_RATIO);
    }

    #[test]
    fn test_multi_word_insufficient_coverage() {
        let outcome = match_pronunciation("banana", "the big red dog runs");
        assert!(!outcome.matched);
    }

    #[test]
    fn test_empty_recognition_never_matches() {
        assert!(!match_pronunciation("", "cat").matched);
        assert!(!match_pronunciation("   ", "cat").matched);
    }

    #[test]
    fn test_deterministic() {
        let first = match_pronunciation("sip", "ship");
        let second = match_pronunciation("sip", "ship");
        assert_eq!(first, second);
    }
}
