//! Sampling: a deterministic, replay-safe decision of whether a given
//! validator should revalidate a given inference, reused both at the
//! normal sampling point and during post-restart recovery.

use std::collections::HashSet;

use node_crypto::hashing;

/// Chain-governed sampling parameters for one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationParams {
    /// Base sampling rate in basis points (1/10000) before power weighting.
    pub sample_rate_bps: u32,
}

/// Per-inference identity the sampling decision is made against.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceSummary {
    pub inference_id: String,
    pub executor_address: String,
}

/// Self-validation and zero-stake exclusions, applied before the
/// probabilistic draw.
pub fn is_eligible(
    executor_address: &str,
    validator_address: &str,
    total_power: u64,
    executor_power: u64,
) -> bool {
    executor_address != validator_address && total_power > executor_power
}

fn deterministic_draw(seed: &[u8], inference_id: &str, validator_address: &str) -> u64 {
    let digest = hashing::hash_many(&[seed, inference_id.as_bytes(), validator_address.as_bytes()]);
    u64::from_be_bytes(digest[0..8].try_into().expect("8-byte slice"))
}

/// Deterministic function of the epoch seed and the involved powers: the
/// same inputs always produce the same yes/no decision, so a restarted
/// validator reconstructs identical sampling without consulting a log.
pub fn should_validate(
    seed: &[u8],
    inference_id: &str,
    validator_address: &str,
    total_power: u64,
    validator_power: u64,
    executor_power: u64,
    params: &ValidationParams,
) -> bool {
    if total_power == 0 {
        return false;
    }
    let numerator = u128::from(params.sample_rate_bps) * u128::from(validator_power);
    let denominator = 10_000u128 * u128::from(total_power);
    if denominator == 0 {
        return false;
    }
    let threshold = ((u128::from(u64::MAX) * numerator) / denominator).min(u128::from(u64::MAX)) as u64;
    deterministic_draw(seed, inference_id, validator_address) < threshold
}

/// Recovery path after a restart: recompute which inferences in `epoch`
/// should have been validated, then diff against what was actually
/// submitted.
pub fn detect_missed_validations(
    seed: &[u8],
    inferences: &[InferenceSummary],
    total_power: u64,
    validator_power: u64,
    executor_power_of: impl Fn(&str) -> u64,
    validator_address: &str,
    params: &ValidationParams,
    already_submitted: &HashSet<String>,
) -> Vec<String> {
    inferences
        .iter()
        .filter(|inf| !already_submitted.contains(&inf.inference_id))
        .filter(|inf| {
            let executor_power = executor_power_of(&inf.executor_address);
            is_eligible(&inf.executor_address, validator_address, total_power, executor_power)
                && should_validate(
                    seed,
                    &inf.inference_id,
                    validator_address,
                    total_power,
                    validator_power,
                    executor_power,
                    params,
                )
        })
        .map(|inf| inf.inference_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ineligible_when_executor_is_self() {
        assert!(!is_eligible("validator-1", "validator-1", 1000, 10));
    }

    #[test]
    fn ineligible_when_total_power_not_above_executor_power() {
        assert!(!is_eligible("executor-1", "validator-1", 100, 100));
    }

    #[test]
    fn eligible_when_executor_differs_and_has_less_than_total_power() {
        assert!(is_eligible("executor-1", "validator-1", 1000, 100));
    }

    #[test]
    fn decision_is_deterministic_for_the_same_inputs() {
        let params = ValidationParams { sample_rate_bps: 2000 };
        let a = should_validate(b"seed", "inf-1", "val-1", 1000, 100, 50, &params);
        let b = should_validate(b"seed", "inf-1", "val-1", 1000, 100, 50, &params);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_sample_rate_never_validates() {
        let params = ValidationParams { sample_rate_bps: 0 };
        for i in 0..50 {
            let id = format!("inf-{i}");
            assert!(!should_validate(b"seed", &id, "val-1", 1000, 900, 50, &params));
        }
    }

    #[test]
    fn full_sample_rate_with_all_power_always_validates() {
        let params = ValidationParams { sample_rate_bps: 10_000 };
        for i in 0..50 {
            let id = format!("inf-{i}");
            assert!(should_validate(b"seed", &id, "val-1", 1000, 1000, 50, &params));
        }
    }

    #[test]
    fn detect_missed_validations_skips_already_submitted() {
        let inferences = vec![
            InferenceSummary { inference_id: "inf-1".to_string(), executor_address: "exec-1".to_string() },
            InferenceSummary { inference_id: "inf-2".to_string(), executor_address: "exec-1".to_string() },
        ];
        let mut submitted = HashSet::new();
        submitted.insert("inf-1".to_string());
        let params = ValidationParams { sample_rate_bps: 10_000 };
        let missed = detect_missed_validations(
            b"seed",
            &inferences,
            1000,
            900,
            |_| 50,
            "val-1",
            &params,
            &submitted,
        );
        assert_eq!(missed, vec!["inf-2".to_string()]);
    }
}
