//! Reciprocal Rank Fusion.
//!
//! Rank-only fusion: `rrf(item) = Σ_list 1 / (k + rank_in_list)`. A chunk
//! appearing in only one list still participates with that list's term
//! alone.

use std::collections::HashMap;
use std::hash::Hash;

pub const RRF_K: f64 = 60.0;

/// Fuses any number of ranked lists (best-first, 0-indexed) keyed by
/// `K`, returning `(key, rrf_score)` pairs sorted descending by score.
/// Ties are broken by first-seen order across the input lists.
pub fn reciprocal_rank_fusion<K>(lists: &[Vec<K>], k: f64) -> Vec<(K, f64)>
where
    K: Eq + Hash + Clone,
{
    let mut scores: HashMap<K, f64> = HashMap::new();
    let mut order: Vec<K> = Vec::new();

    for list in lists {
        for (rank, item) in list.iter().enumerate() {
            let entry = scores.entry(item.clone()).or_insert_with(|| {
                order.push(item.clone());
                0.0
            });
            *entry += 1.0 / (k + rank as f64 + 1.0);
        }
    }

    let mut fused: Vec<(K, f64)> = order
        .into_iter()
        .map(|key| {
            let score = scores[&key];
            (key, score)
        })
        .collect();

    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_in_both_lists_outranks_single_list_item() {
        let dense = vec!["a", "b", "c"];
        let sparse = vec!["b", "d", "a"];
        let fused = reciprocal_rank_fusion(&[dense, sparse], RRF_K);
        // "a": rank0 + rank2 ; "b": rank1 + rank0 ; both appear twice, "c"/"d" once.
        assert_eq!(fused.len(), 4);
        let top_two: Vec<&str> = fused.iter().take(2).map(|(k, _)| *k).collect();
        assert!(top_two.contains(&"a"));
        assert!(top_two.contains(&"b"));
    }

    #[test]
    fn solo_list_item_still_participates() {
        let dense: Vec<&str> = vec!["x"];
        let sparse: Vec<&str> = vec![];
        let fused = reciprocal_rank_fusion(&[dense, sparse], RRF_K);
        assert_eq!(fused, vec![("x", 1.0 / 61.0)]);
    }
}
