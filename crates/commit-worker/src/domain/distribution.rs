//! Per-participant weight distribution: scale raw artifact counts so they
//! sum exactly to the chain-accepted leaf count, rounding down and handing
//! the remainder to the lowest-sorted node ids first.

use std::collections::BTreeMap;

/// `raw_counts` maps `node_id -> artifacts submitted`. Returns a map of the
/// same keys whose values sum to exactly `target_total`.
pub fn distribute_weights(raw_counts: &BTreeMap<String, u64>, target_total: u64) -> BTreeMap<String, u64> {
    let raw_sum: u64 = raw_counts.values().sum();
    if raw_sum == 0 || raw_counts.is_empty() {
        return raw_counts.keys().map(|k| (k.clone(), 0)).collect();
    }

    let mut scaled: BTreeMap<String, u64> = BTreeMap::new();
    let mut remainders: Vec<(String, u64)> = Vec::new();
    let mut assigned: u64 = 0;

    for (id, &count) in raw_counts {
        let numerator = count as u128 * target_total as u128;
        let whole = (numerator / raw_sum as u128) as u64;
        let remainder = (numerator % raw_sum as u128) as u64;
        scaled.insert(id.clone(), whole);
        remainders.push((id.clone(), remainder));
        assigned += whole;
    }

    let mut leftover = target_total.saturating_sub(assigned);
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (id, _) in remainders {
        if leftover == 0 {
            break;
        }
        *scaled.get_mut(&id).expect("key present") += 1;
        leftover -= 1;
    }

    scaled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_exactly_to_target() {
        let mut raw = BTreeMap::new();
        raw.insert("a".to_string(), 7);
        raw.insert("b".to_string(), 3);
        raw.insert("c".to_string(), 1);
        let out = distribute_weights(&raw, 100);
        assert_eq!(out.values().sum::<u64>(), 100);
    }

    #[test]
    fn proportional_scaling_is_preserved() {
        let mut raw = BTreeMap::new();
        raw.insert("a".to_string(), 1);
        raw.insert("b".to_string(), 1);
        let out = distribute_weights(&raw, 11);
        // one of them gets the extra unit from the remainder
        assert!(out["a"] == 6 || out["b"] == 6);
        assert_eq!(out.values().sum::<u64>(), 11);
    }

    #[test]
    fn empty_input_yields_empty_map() {
        let raw = BTreeMap::new();
        assert!(distribute_weights(&raw, 50).is_empty());
    }

    #[test]
    fn zero_raw_sum_distributes_nothing() {
        let mut raw = BTreeMap::new();
        raw.insert("a".to_string(), 0);
        raw.insert("b".to_string(), 0);
        let out = distribute_weights(&raw, 10);
        assert_eq!(out["a"], 0);
        assert_eq!(out["b"], 0);
    }
}
