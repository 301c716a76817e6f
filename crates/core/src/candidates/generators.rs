//! Signal-specific candidate generators

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::{
    sort_scored, CandidateGenerator, GeneratorKind, ScoredItem, CATEGORY_SCORE_FACTOR,
    DEFAULT_POPULARITY_TOP_K,
};
use crate::domain::category::{complementary_categories, Category};
use crate::features::FeatureStore;

fn into_ranked(scores: BTreeMap<String, f64>) -> Vec<ScoredItem> {
    let mut items: Vec<ScoredItem> =
        scores.into_iter().map(|(item_name, score)| ScoredItem { item_name, score }).collect();
    sort_scored(&mut items);
    items
}

/// Sums co-occurrence probability from every cart item toward each related item.
#[derive(Clone, Copy, Debug, Default)]
pub struct CooccurrenceGenerator;

impl CandidateGenerator for CooccurrenceGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Cooccurrence
    }

    fn generate(
        &self,
        features: &FeatureStore,
        current_items: &[String],
        exclude: &HashSet<String>,
    ) -> Vec<ScoredItem> {
        let mut scores: BTreeMap<String, f64> = BTreeMap::new();
        for item in current_items {
            for (related, probability) in features.related_items(item) {
                if exclude.contains(related) {
                    continue;
                }
                *scores.entry(related.to_string()).or_insert(0.0) += probability;
            }
        }
        into_ranked(scores)
    }
}

/// Sums association-rule confidence from every cart item toward each consequent.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarketBasketGenerator;

impl CandidateGenerator for MarketBasketGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::MarketBasket
    }

    fn generate(
        &self,
        features: &FeatureStore,
        current_items: &[String],
        exclude: &HashSet<String>,
    ) -> Vec<ScoredItem> {
        let mut scores: BTreeMap<String, f64> = BTreeMap::new();
        for item in current_items {
            for rule in features.market_basket_rules(item) {
                if exclude.contains(&rule.consequent) {
                    continue;
                }
                *scores.entry(rule.consequent.clone()).or_insert(0.0) += rule.confidence;
            }
        }
        into_ranked(scores)
    }
}

/// Scores observed items that belong to a category complementing the cart.
#[derive(Clone, Copy, Debug, Default)]
pub struct CategoryGenerator;

impl CategoryGenerator {
    pub fn target_categories(features: &FeatureStore, current_items: &[String]) -> Vec<Category> {
        let present: BTreeSet<Category> =
            current_items.iter().map(|item| features.category_of(item)).collect();
        complementary_categories(present)
    }
}

impl CandidateGenerator for CategoryGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Category
    }

    fn generate(
        &self,
        features: &FeatureStore,
        current_items: &[String],
        exclude: &HashSet<String>,
    ) -> Vec<ScoredItem> {
        let targets = Self::target_categories(features, current_items);

        let scores = features
            .categories()
            .filter(|(item, category)| !exclude.contains(*item) && targets.contains(category))
            .map(|(item, _)| (item.to_string(), features.item_frequency(item) * CATEGORY_SCORE_FACTOR))
            .collect();
        into_ranked(scores)
    }
}

/// Most frequent items overall, independent of the cart.
#[derive(Clone, Copy, Debug)]
pub struct PopularityGenerator {
    top_k: usize,
}

impl PopularityGenerator {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

impl Default for PopularityGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_POPULARITY_TOP_K)
    }
}

impl CandidateGenerator for PopularityGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Popularity
    }

    fn generate(
        &self,
        features: &FeatureStore,
        _current_items: &[String],
        exclude: &HashSet<String>,
    ) -> Vec<ScoredItem> {
        let mut items: Vec<ScoredItem> = features
            .frequencies()
            .filter(|(item, _)| !exclude.contains(*item))
            .map(|(item, frequency)| ScoredItem::new(item, frequency))
            .collect();
        sort_scored(&mut items);
        items.truncate(self.top_k);
        items
    }
}

/// The four standard generators in blending order.
pub fn default_generators(popularity_top_k: usize) -> Vec<Box<dyn CandidateGenerator>> {
    vec![
        Box::new(CooccurrenceGenerator),
        Box::new(MarketBasketGenerator),
        Box::new(CategoryGenerator),
        Box::new(PopularityGenerator::new(popularity_top_k)),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::domain::order::Order;

    fn sample_features() -> FeatureStore {
        FeatureStore::build(&[
            Order::new("1", ["Traditional Wings", "Ranch Dip"]),
            Order::new("2", ["Traditional Wings", "Fries"]),
            Order::new("3", ["Fries", "Soda"]),
        ])
    }

    fn cart(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| (*item).to_string()).collect()
    }

    fn exclude(items: &[&str]) -> HashSet<String> {
        items.iter().map(|item| (*item).to_string()).collect()
    }

    fn names(items: &[ScoredItem]) -> Vec<&str> {
        items.iter().map(|item| item.item_name.as_str()).collect()
    }

    #[test]
    fn generators_return_empty_for_empty_features() {
        let features = FeatureStore::build(&[]);
        let current = cart(&["Traditional Wings"]);
        let excluded = exclude(&["Traditional Wings"]);

        for generator in default_generators(10) {
            assert!(
                generator.generate(&features, &current, &excluded).is_empty(),
                "{} produced candidates from no history",
                generator.kind().as_str()
            );
        }
    }

    #[test]
    fn cooccurrence_candidates_follow_shared_orders() {
        let features = sample_features();
        let current = cart(&["Traditional Wings"]);

        let items = CooccurrenceGenerator.generate(&features, &current, &exclude(&["Traditional Wings"]));

        assert_eq!(names(&items), vec!["Fries", "Ranch Dip"]);
        assert!(items.iter().all(|item| (item.score - 1.0 / 6.0).abs() < 1e-9));
    }

    #[test]
    fn cooccurrence_scores_sum_across_cart_items() {
        let features = sample_features();
        let current = cart(&["Traditional Wings", "Soda"]);

        let items = CooccurrenceGenerator.generate(
            &features,
            &current,
            &exclude(&["Traditional Wings", "Soda"]),
        );

        assert_eq!(items[0].item_name, "Fries");
        assert!((items[0].score - 2.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn market_basket_respects_exclusions() {
        let features = sample_features();
        let current = cart(&["Traditional Wings"]);

        let items = MarketBasketGenerator.generate(
            &features,
            &current,
            &exclude(&["Traditional Wings", "Fries"]),
        );

        assert_eq!(names(&items), vec!["Ranch Dip"]);
        assert!((items[0].score - 0.25).abs() < 1e-9);
    }

    #[test]
    fn category_generator_scores_complementary_items() {
        let features = sample_features();
        let current = cart(&["Traditional Wings"]);

        // Wings complement drinks and sides; only Soda is a drink here.
        let items = CategoryGenerator.generate(&features, &current, &exclude(&["Traditional Wings"]));

        assert_eq!(names(&items), vec!["Soda"]);
        assert!((items[0].score - (1.0 / 6.0) * 0.5).abs() < 1e-9);
    }

    #[test]
    fn category_generator_falls_back_to_default_complements() {
        let features = sample_features();
        let current = cart(&["Ranch Dip"]);

        let targets = CategoryGenerator::target_categories(&features, &current);
        assert_eq!(targets, vec![Category::Wings, Category::Sides, Category::Drinks]);

        let items = CategoryGenerator.generate(&features, &current, &exclude(&["Ranch Dip"]));
        assert_eq!(names(&items), vec!["Traditional Wings", "Soda"]);
    }

    #[test]
    fn popularity_excludes_then_truncates() {
        let features = sample_features();

        let items = PopularityGenerator::new(2).generate(&features, &[], &exclude(&["Fries"]));

        assert_eq!(names(&items), vec!["Traditional Wings", "Ranch Dip"]);
    }
}
