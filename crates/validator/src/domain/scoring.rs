//! Replay scoring: compares the logits produced by a local replay of an
//! inference against the executor's originally reported logits.

use std::collections::BTreeMap;

pub type TopLogprobs = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionLogits {
    pub token: String,
    pub top_logprobs: TopLogprobs,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreOutcome {
    DifferentLength,
    DifferentTokens,
    Scored(f64),
}

impl ScoreOutcome {
    pub fn similarity(&self) -> f64 {
        match self {
            ScoreOutcome::Scored(s) => *s,
            _ => 0.0,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.similarity() > 0.99
    }
}

/// `min1 - (min2 - min1)` where `min1`/`min2` are the two smallest original
/// logprobs at a position; falls back to `min1 - 100` for a single-element
/// set, used when the validation run emitted a token absent from the
/// original top-logprobs at that position.
fn extrapolated_logprob(original: &TopLogprobs) -> f64 {
    let mut values: Vec<f64> = original.values().copied().collect();
    values.sort_by(|a, b| a.partial_cmp(b).expect("logprobs are finite"));
    match values.as_slice() {
        [] => 0.0,
        [only] => only - 100.0,
        [min1, min2, ..] => min1 - (min2 - min1),
    }
}

fn position_distance(original: &TopLogprobs, validation: &TopLogprobs) -> f64 {
    let extrapolated = extrapolated_logprob(original);
    let mut sum = 0.0;
    for (token, v_logprob) in validation {
        let o_logprob = original.get(token).copied().unwrap_or(extrapolated);
        sum += (v_logprob - o_logprob).abs() / (1e-6 + v_logprob.abs() + o_logprob.abs());
    }
    sum / 2.0
}

pub fn score_replay(original: &[PositionLogits], validation: &[PositionLogits]) -> ScoreOutcome {
    if validation.len() < original.len() {
        return ScoreOutcome::DifferentLength;
    }
    for (o, v) in original.iter().zip(validation.iter()) {
        if o.token != v.token {
            return ScoreOutcome::DifferentTokens;
        }
    }

    let n = original.len();
    let k = original.iter().map(|p| p.top_logprobs.len()).max().unwrap_or(0).max(1);
    let total_distance: f64 = original
        .iter()
        .zip(validation.iter())
        .map(|(o, v)| position_distance(&o.top_logprobs, &v.top_logprobs))
        .sum();
    let distance = total_distance / (100usize.max(n) * k) as f64;
    ScoreOutcome::Scored((1.0 - distance).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(token: &str, logprobs: &[(&str, f64)]) -> PositionLogits {
        PositionLogits {
            token: token.to_string(),
            top_logprobs: logprobs.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
        }
    }

    #[test]
    fn shorter_validation_is_different_length() {
        let original = vec![position("a", &[("a", -0.1)]), position("b", &[("b", -0.2)])];
        let validation = vec![position("a", &[("a", -0.1)])];
        assert_eq!(score_replay(&original, &validation), ScoreOutcome::DifferentLength);
    }

    #[test]
    fn mismatched_token_is_different_tokens() {
        let original = vec![position("a", &[("a", -0.1)])];
        let validation = vec![position("b", &[("b", -0.1)])];
        assert_eq!(score_replay(&original, &validation), ScoreOutcome::DifferentTokens);
    }

    #[test]
    fn identical_logits_score_perfect_similarity() {
        let original = vec![
            position("a", &[("a", -0.1), ("b", -2.0)]),
            position("c", &[("c", -0.05), ("d", -3.0)]),
        ];
        let validation = original.clone();
        let outcome = score_replay(&original, &validation);
        assert!(outcome.is_successful());
        assert!((outcome.similarity() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn diverging_logprobs_reduce_similarity() {
        let original = vec![position("a", &[("a", -0.1), ("b", -2.0)])];
        let validation = vec![position("a", &[("a", -5.0), ("b", -2.0)])];
        let outcome = score_replay(&original, &validation);
        assert!(outcome.similarity() < 1.0);
        assert!(!outcome.is_successful());
    }

    #[test]
    fn extrapolates_missing_token_from_two_smallest_logprobs() {
        let mut top = TopLogprobs::new();
        top.insert("a".to_string(), -1.0);
        top.insert("b".to_string(), -3.0);
        // min1 = -3.0, min2 = -1.0 => -3.0 - (-1.0 - -3.0) = -3.0 - 2.0 = -5.0
        assert!((extrapolated_logprob(&top) - (-5.0)).abs() < 1e-9);
    }

    #[test]
    fn extrapolates_single_element_with_flat_fallback() {
        let mut top = TopLogprobs::new();
        top.insert("a".to_string(), -2.0);
        assert!((extrapolated_logprob(&top) - (-102.0)).abs() < 1e-9);
    }
}
