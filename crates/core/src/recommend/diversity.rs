//! Category spread over a ranked candidate list

use crate::candidates::ScoredItem;
use crate::domain::category::Category;
use crate::features::FeatureStore;

/// Round-robin over categories: each round takes the next-best remaining item
/// of every category, categories visited in order of their best item, until
/// `pool_size` items are picked or the input runs out.
///
/// `ranked` must already be sorted best-first.
pub fn diversify(ranked: &[ScoredItem], features: &FeatureStore, pool_size: usize) -> Vec<ScoredItem> {
    let mut buckets: Vec<(Category, Vec<&ScoredItem>)> = Vec::new();
    for item in ranked {
        let category = features.category_of(&item.item_name);
        match buckets.iter_mut().find(|(existing, _)| *existing == category) {
            Some((_, bucket)) => bucket.push(item),
            None => buckets.push((category, vec![item])),
        }
    }

    let mut picked = Vec::with_capacity(pool_size.min(ranked.len()));
    let mut round = 0;
    while picked.len() < pool_size {
        let mut took_any = false;
        for (_, bucket) in &buckets {
            if picked.len() >= pool_size {
                break;
            }
            if let Some(item) = bucket.get(round) {
                picked.push((*item).clone());
                took_any = true;
            }
        }
        if !took_any {
            break;
        }
        round += 1;
    }
    picked
}
