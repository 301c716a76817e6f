//! History-free baseline: top blended candidates, padded with fallback items

use std::collections::HashSet;
use std::sync::Arc;

use super::catalog::PromotionCatalog;
use super::DEFAULT_BASELINE_TOP_K;
use crate::candidates::ScoreBlender;
use crate::features::FeatureStore;

#[derive(Debug)]
pub struct BaselineRecommender {
    features: Arc<FeatureStore>,
    blender: ScoreBlender,
    catalog: PromotionCatalog,
    top_k: usize,
}

impl BaselineRecommender {
    pub fn new(features: impl Into<Arc<FeatureStore>>) -> Self {
        Self {
            features: features.into(),
            blender: ScoreBlender::new(),
            catalog: PromotionCatalog::default(),
            top_k: DEFAULT_BASELINE_TOP_K,
        }
    }

    pub fn with_blender(mut self, blender: ScoreBlender) -> Self {
        self.blender = blender;
        self
    }

    pub fn with_catalog(mut self, catalog: PromotionCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Best `top_k` items for a cart. Short lists are padded from the fallback
    /// items; the result is only shorter than `top_k` when those run out too.
    pub fn predict(&self, current_items: &[String]) -> Vec<String> {
        let exclude: HashSet<String> = current_items.iter().cloned().collect();
        let mut predicted: Vec<String> = self
            .blender
            .rank(&self.features, current_items, &exclude, self.top_k)
            .into_iter()
            .map(|candidate| candidate.item_name)
            .collect();

        if predicted.len() < self.top_k {
            let mut taken = exclude;
            taken.extend(predicted.iter().cloned());
            let padding: Vec<String> = self
                .catalog
                .fallback_items(&taken)
                .into_iter()
                .take(self.top_k - predicted.len())
                .map(str::to_string)
                .collect();
            predicted.extend(padding);
        }
        predicted
    }

    pub fn predict_batch(&self, carts: &[Vec<String>]) -> Vec<Vec<String>> {
        carts.iter().map(|cart| self.predict(cart)).collect()
    }
}
