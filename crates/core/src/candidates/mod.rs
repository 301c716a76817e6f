//! Candidate Generation
//!
//! Four independent strategies turn the feature store plus the current cart
//! into scored candidate items. The blender merges their outputs with named,
//! overridable weights into one ranked list.

mod blend;
mod generators;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub use blend::{BlendWeights, ScoreBlender};
pub use generators::{
    default_generators, CategoryGenerator, CooccurrenceGenerator, MarketBasketGenerator,
    PopularityGenerator,
};

use crate::features::FeatureStore;

/// Default blend weights
pub const DEFAULT_WEIGHTS: BlendWeights =
    BlendWeights { cooccurrence: 0.40, market_basket: 0.30, category: 0.20, popularity: 0.10 };

/// Multiplier applied to item frequency for complementary-category candidates
pub const CATEGORY_SCORE_FACTOR: f64 = 0.5;

/// Items returned by the popularity generator
pub const DEFAULT_POPULARITY_TOP_K: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_name: String,
    pub score: f64,
}

impl ScoredItem {
    pub fn new(item_name: impl Into<String>, score: f64) -> Self {
        Self { item_name: item_name.into(), score }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    Cooccurrence,
    MarketBasket,
    Category,
    Popularity,
}

impl GeneratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cooccurrence => "cooccurrence",
            Self::MarketBasket => "market_basket",
            Self::Category => "category",
            Self::Popularity => "popularity",
        }
    }
}

/// A single signal source. Implementations never fail: sparse or empty
/// inputs produce an empty list.
pub trait CandidateGenerator: Send + Sync {
    fn kind(&self) -> GeneratorKind;

    fn generate(
        &self,
        features: &FeatureStore,
        current_items: &[String],
        exclude: &HashSet<String>,
    ) -> Vec<ScoredItem>;
}

/// Descending by score, then item name ascending.
pub(crate) fn sort_scored(items: &mut [ScoredItem]) {
    items.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.item_name.cmp(&b.item_name))
    });
}
