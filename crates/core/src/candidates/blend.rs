//! Weighted blending of generator outputs

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::generators::default_generators;
use super::{sort_scored, CandidateGenerator, GeneratorKind, ScoredItem, DEFAULT_POPULARITY_TOP_K};
use crate::errors::DomainError;
use crate::features::FeatureStore;

/// Per-strategy weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    /// Weight for co-occurrence candidates (default: 0.40)
    pub cooccurrence: f64,
    /// Weight for market-basket candidates (default: 0.30)
    pub market_basket: f64,
    /// Weight for category-complement candidates (default: 0.20)
    pub category: f64,
    /// Weight for popularity candidates (default: 0.10)
    pub popularity: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

impl BlendWeights {
    pub fn weight_for(&self, kind: GeneratorKind) -> f64 {
        match kind {
            GeneratorKind::Cooccurrence => self.cooccurrence,
            GeneratorKind::MarketBasket => self.market_basket,
            GeneratorKind::Category => self.category,
            GeneratorKind::Popularity => self.popularity,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, value) in [
            ("cooccurrence", self.cooccurrence),
            ("market_basket", self.market_basket),
            ("category", self.category),
            ("popularity", self.popularity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::InvalidInput(format!(
                    "blend weight `{name}` must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Runs every generator against the cart and merges their scores.
pub struct ScoreBlender {
    weights: BlendWeights,
    generators: Vec<Box<dyn CandidateGenerator>>,
}

impl ScoreBlender {
    /// Create a blender with default weights and the standard generators
    pub fn new() -> Self {
        Self::with_weights(BlendWeights::default())
    }

    /// Create with custom weights
    pub fn with_weights(weights: BlendWeights) -> Self {
        Self { weights, generators: default_generators(DEFAULT_POPULARITY_TOP_K) }
    }

    pub fn with_generators(mut self, generators: Vec<Box<dyn CandidateGenerator>>) -> Self {
        self.generators = generators;
        self
    }

    pub fn weights(&self) -> &BlendWeights {
        &self.weights
    }

    /// Sum weighted contributions per item; ties resolve by item name.
    pub fn blend(&self, outputs: &[(GeneratorKind, Vec<ScoredItem>)]) -> Vec<ScoredItem> {
        let mut combined: BTreeMap<&str, f64> = BTreeMap::new();

        for (kind, items) in outputs {
            let weight = self.weights.weight_for(*kind);
            for item in items {
                *combined.entry(item.item_name.as_str()).or_insert(0.0) += item.score * weight;
            }
        }

        let mut ranked: Vec<ScoredItem> =
            combined.into_iter().map(|(item, score)| ScoredItem::new(item, score)).collect();
        sort_scored(&mut ranked);
        ranked
    }

    /// Generate, blend and keep the best `limit` candidates.
    pub fn rank(
        &self,
        features: &FeatureStore,
        current_items: &[String],
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Vec<ScoredItem> {
        let outputs: Vec<(GeneratorKind, Vec<ScoredItem>)> = self
            .generators
            .iter()
            .map(|generator| (generator.kind(), generator.generate(features, current_items, exclude)))
            .collect();

        let mut ranked = self.blend(&outputs);
        ranked.truncate(limit);
        ranked
    }
}

impl Default for ScoreBlender {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScoreBlender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<&str> = self.generators.iter().map(|g| g.kind().as_str()).collect();
        f.debug_struct("ScoreBlender")
            .field("weights", &self.weights)
            .field("generators", &kinds)
            .finish()
    }
}
