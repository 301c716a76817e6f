//! Feature Store
//!
//! Aggregate statistics derived from a batch of historical orders: item
//! frequency, pairwise co-occurrence, market-basket association rules,
//! keyword categories and per-segment popularity. Artifacts are rebuilt
//! wholesale from each batch; there is no incremental update.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::category::{categorize, Category};
use crate::domain::channel::{CustomerType, Platform};
use crate::domain::item::MenuItem;
use crate::domain::order::Order;
use crate::errors::DomainError;

/// Rules at or below this confidence are discarded.
pub const DEFAULT_MIN_RULE_CONFIDENCE: f64 = 0.1;

/// Rules kept per antecedent item.
pub const DEFAULT_MAX_RULES_PER_ITEM: usize = 10;

/// How raw pair counts are turned into co-occurrence probabilities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooccurrenceNormalization {
    /// Pair count over the number of ordered pairs in the whole dataset.
    /// Not a conditional probability, but kept as the default for
    /// compatibility with existing score calibrations.
    #[default]
    Global,
    /// Pair count over the number of orders containing the first item,
    /// i.e. P(b | a).
    PerItem,
}

impl std::str::FromStr for CooccurrenceNormalization {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "global" => Ok(Self::Global),
            "per_item" => Ok(Self::PerItem),
            other => Err(DomainError::InvalidInput(format!(
                "unsupported co-occurrence normalization `{other}` (expected global|per_item)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureOptions {
    pub normalization: CooccurrenceNormalization,
    pub min_rule_confidence: f64,
    pub max_rules_per_item: usize,
}

impl Default for FeatureOptions {
    fn default() -> Self {
        Self {
            normalization: CooccurrenceNormalization::Global,
            min_rule_confidence: DEFAULT_MIN_RULE_CONFIDENCE,
            max_rules_per_item: DEFAULT_MAX_RULES_PER_ITEM,
        }
    }
}

/// Directional rule `antecedent -> consequent`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub consequent: String,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default)]
pub struct FeatureStore {
    options: FeatureOptions,
    order_count: usize,
    total_occurrences: usize,
    total_pairs: usize,
    item_counts: BTreeMap<String, usize>,
    /// Number of orders containing each item.
    order_support: BTreeMap<String, usize>,
    cooccurrence: BTreeMap<String, BTreeMap<String, f64>>,
    rules: BTreeMap<String, Vec<AssociationRule>>,
    categories: BTreeMap<String, Category>,
    channel_popularity: BTreeMap<String, BTreeMap<String, f64>>,
    customer_type_popularity: BTreeMap<CustomerType, BTreeMap<String, f64>>,
}

impl FeatureStore {
    pub fn build(orders: &[Order]) -> Self {
        Self::build_with_options(orders, FeatureOptions::default())
    }

    pub fn build_with_options(orders: &[Order], options: FeatureOptions) -> Self {
        let mut store = Self { options, order_count: orders.len(), ..Self::default() };

        let mut pair_counts: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        let mut channel_counts: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        let mut type_counts: BTreeMap<CustomerType, BTreeMap<String, usize>> = BTreeMap::new();

        for order in orders {
            for item in &order.items {
                *store.item_counts.entry(item.clone()).or_insert(0) += 1;
                store.total_occurrences += 1;

                if let Some(channel) = &order.channel {
                    let key = channel.trim().to_ascii_lowercase();
                    *channel_counts.entry(key).or_default().entry(item.clone()).or_insert(0) += 1;
                }
                if let Some(customer_type) = order.customer_type {
                    *type_counts
                        .entry(customer_type)
                        .or_default()
                        .entry(item.clone())
                        .or_insert(0) += 1;
                }
            }

            let unique = order.unique_items();
            for item in &unique {
                *store.order_support.entry((*item).to_string()).or_insert(0) += 1;
            }
            for (i, first) in unique.iter().enumerate() {
                for (j, second) in unique.iter().enumerate() {
                    if i == j {
                        continue;
                    }
                    *pair_counts
                        .entry((*first).to_string())
                        .or_default()
                        .entry((*second).to_string())
                        .or_insert(0) += 1;
                    store.total_pairs += 1;
                }
            }
        }

        store.cooccurrence = store.normalize_pairs(&pair_counts);
        store.rules = store.derive_rules();
        store.categories =
            store.item_counts.keys().map(|item| (item.clone(), categorize(item))).collect();
        store.channel_popularity = channel_counts.into_iter().map(|(k, v)| (k, shares(v))).collect();
        store.customer_type_popularity =
            type_counts.into_iter().map(|(k, v)| (k, shares(v))).collect();

        info!(
            event_name = "features.build.completed",
            orders = store.order_count,
            items = store.item_counts.len(),
            pairs = store.total_pairs,
            rules = store.rules.len(),
            "feature store rebuilt"
        );

        store
    }

    fn normalize_pairs(
        &self,
        pair_counts: &BTreeMap<String, BTreeMap<String, usize>>,
    ) -> BTreeMap<String, BTreeMap<String, f64>> {
        pair_counts
            .iter()
            .map(|(first, related)| {
                let denominator = match self.options.normalization {
                    CooccurrenceNormalization::Global => self.total_pairs,
                    CooccurrenceNormalization::PerItem => {
                        self.order_support.get(first).copied().unwrap_or(0)
                    }
                };
                let probabilities = related
                    .iter()
                    .map(|(second, count)| (second.clone(), ratio(*count, denominator)))
                    .collect();
                (first.clone(), probabilities)
            })
            .collect()
    }

    fn derive_rules(&self) -> BTreeMap<String, Vec<AssociationRule>> {
        let mut rules = BTreeMap::new();

        for (antecedent, related) in &self.cooccurrence {
            let support = self.support(antecedent);
            let mut candidates: Vec<AssociationRule> = related
                .iter()
                .map(|(consequent, probability)| {
                    let confidence = match self.options.normalization {
                        CooccurrenceNormalization::Global if support > 0.0 => probability / support,
                        CooccurrenceNormalization::Global => 0.0,
                        CooccurrenceNormalization::PerItem => *probability,
                    };
                    AssociationRule {
                        consequent: consequent.clone(),
                        confidence: confidence.clamp(0.0, 1.0),
                    }
                })
                .filter(|rule| rule.confidence > self.options.min_rule_confidence)
                .collect();

            if candidates.is_empty() {
                continue;
            }

            candidates.sort_by(|a, b| {
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.consequent.cmp(&b.consequent))
            });
            candidates.truncate(self.options.max_rules_per_item);
            rules.insert(antecedent.clone(), candidates);
        }

        rules
    }

    pub fn options(&self) -> &FeatureOptions {
        &self.options
    }

    pub fn order_count(&self) -> usize {
        self.order_count
    }

    pub fn is_empty(&self) -> bool {
        self.item_counts.is_empty()
    }

    /// Share of all item occurrences taken by `item`.
    pub fn item_frequency(&self, item: &str) -> f64 {
        ratio(self.item_counts.get(item).copied().unwrap_or(0), self.total_occurrences)
    }

    /// Every observed item with its frequency, in name order.
    pub fn frequencies(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.item_counts
            .iter()
            .map(move |(item, count)| (item.as_str(), ratio(*count, self.total_occurrences)))
    }

    /// Fraction of orders containing `item`.
    pub fn support(&self, item: &str) -> f64 {
        ratio(self.order_support.get(item).copied().unwrap_or(0), self.order_count)
    }

    pub fn cooccurrence(&self, first: &str, second: &str) -> f64 {
        self.cooccurrence.get(first).and_then(|related| related.get(second)).copied().unwrap_or(0.0)
    }

    pub fn related_items(&self, item: &str) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.cooccurrence
            .get(item)
            .into_iter()
            .flat_map(|related| related.iter().map(|(name, p)| (name.as_str(), *p)))
    }

    pub fn market_basket_rules(&self, item: &str) -> &[AssociationRule] {
        self.rules.get(item).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Category of an observed item, or the keyword category of an unseen one.
    pub fn category_of(&self, item: &str) -> Category {
        self.categories.get(item).copied().unwrap_or_else(|| categorize(item))
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, Category)> + '_ {
        self.categories.iter().map(|(item, category)| (item.as_str(), *category))
    }

    /// Item share among orders placed on `channel` (case-insensitive).
    pub fn channel_frequency(&self, channel: &str, item: &str) -> f64 {
        self.channel_popularity
            .get(&channel.trim().to_ascii_lowercase())
            .and_then(|shares| shares.get(item))
            .copied()
            .unwrap_or(0.0)
    }

    /// Highest item share among channel labels that map to `platform`, so that
    /// `Digital` and `App` exports both count towards the app.
    pub fn platform_frequency(&self, platform: Platform, item: &str) -> f64 {
        self.channel_popularity
            .iter()
            .filter(|(channel, _)| channel.parse::<Platform>() == Ok(platform))
            .filter_map(|(_, shares)| shares.get(item).copied())
            .fold(0.0, f64::max)
    }

    /// Item share among orders placed by customers of `customer_type`.
    pub fn customer_type_frequency(&self, customer_type: CustomerType, item: &str) -> f64 {
        self.customer_type_popularity
            .get(&customer_type)
            .and_then(|shares| shares.get(item))
            .copied()
            .unwrap_or(0.0)
    }

    /// Promotion flags are left unset; see `PromotionCatalog::annotate`.
    pub fn menu_item(&self, name: &str) -> MenuItem {
        MenuItem {
            name: name.to_string(),
            category: self.category_of(name),
            frequency: self.item_frequency(name),
            is_trending: false,
            is_seasonal: false,
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn shares(counts: BTreeMap<String, usize>) -> BTreeMap<String, f64> {
    let total: usize = counts.values().sum();
    counts.into_iter().map(|(item, count)| (item, ratio(count, total))).collect()
}

#[cfg(test)]
mod tests {
    use super::{CooccurrenceNormalization, FeatureOptions, FeatureStore};
    use crate::domain::category::Category;
    use crate::domain::channel::{CustomerType, Platform};
    use crate::domain::order::Order;

    fn sample_orders() -> Vec<Order> {
        vec![
            Order::new("1", ["Traditional Wings", "Ranch Dip"]),
            Order::new("2", ["Traditional Wings", "Fries"]),
            Order::new("3", ["Fries", "Soda"]),
        ]
    }

    #[test]
    fn empty_history_produces_empty_features() {
        let store = FeatureStore::build(&[]);

        assert!(store.is_empty());
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.item_frequency("Fries"), 0.0);
        assert_eq!(store.cooccurrence("Fries", "Soda"), 0.0);
        assert!(store.market_basket_rules("Fries").is_empty());
        assert_eq!(store.frequencies().count(), 0);
    }

    #[test]
    fn frequency_is_share_of_item_occurrences() {
        let store = FeatureStore::build(&sample_orders());

        assert!((store.item_frequency("Traditional Wings") - 2.0 / 6.0).abs() < 1e-9);
        assert!((store.item_frequency("Soda") - 1.0 / 6.0).abs() < 1e-9);
        let total: f64 = store.frequencies().map(|(_, freq)| freq).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn global_cooccurrence_divides_by_all_ordered_pairs() {
        let store = FeatureStore::build(&sample_orders());

        // Three two-item orders contribute six ordered pairs.
        assert!((store.cooccurrence("Traditional Wings", "Ranch Dip") - 1.0 / 6.0).abs() < 1e-9);
        assert!((store.cooccurrence("Ranch Dip", "Traditional Wings") - 1.0 / 6.0).abs() < 1e-9);
        assert_eq!(store.cooccurrence("Traditional Wings", "Traditional Wings"), 0.0);
        assert_eq!(store.cooccurrence("Traditional Wings", "Soda"), 0.0);
    }

    #[test]
    fn duplicate_items_in_one_order_count_once_for_pairs() {
        let store = FeatureStore::build(&[Order::new("1", ["Fries", "Fries", "Soda"])]);

        assert!((store.cooccurrence("Fries", "Soda") - 0.5).abs() < 1e-9);
        assert!((store.item_frequency("Fries") - 2.0 / 3.0).abs() < 1e-9);
        assert!((store.support("Fries") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn per_item_normalization_yields_conditional_probability() {
        let store = FeatureStore::build_with_options(
            &sample_orders(),
            FeatureOptions {
                normalization: CooccurrenceNormalization::PerItem,
                ..FeatureOptions::default()
            },
        );

        assert!((store.cooccurrence("Traditional Wings", "Ranch Dip") - 0.5).abs() < 1e-9);
        assert!((store.cooccurrence("Ranch Dip", "Traditional Wings") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rules_use_confidence_over_support_and_stay_bounded() {
        let store = FeatureStore::build(&sample_orders());
        let rules = store.market_basket_rules("Traditional Wings");

        // (1/6) / (2/3) = 0.25 for both consequents.
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].consequent, "Fries");
        assert!((rules[0].confidence - 0.25).abs() < 1e-9);
        for rule in rules {
            assert!((0.0..=1.0).contains(&rule.confidence));
        }
    }

    #[test]
    fn rules_below_threshold_are_dropped_and_capped() {
        let mut orders = Vec::new();
        for index in 0..12 {
            orders.push(Order::new(
                index.to_string(),
                vec!["Traditional Wings".to_string(), format!("Dip {index}")],
            ));
        }
        let store = FeatureStore::build_with_options(
            &orders,
            FeatureOptions {
                normalization: CooccurrenceNormalization::PerItem,
                min_rule_confidence: 0.05,
                max_rules_per_item: 10,
            },
        );

        assert_eq!(store.market_basket_rules("Traditional Wings").len(), 10);

        let strict = FeatureStore::build_with_options(
            &orders,
            FeatureOptions {
                normalization: CooccurrenceNormalization::PerItem,
                ..FeatureOptions::default()
            },
        );
        // 1/12 is below the default threshold.
        assert!(strict.market_basket_rules("Traditional Wings").is_empty());
        assert_eq!(strict.market_basket_rules("Dip 3").len(), 1);
    }

    #[test]
    fn segment_popularity_is_tracked_per_channel_and_customer_type() {
        let orders = vec![
            Order::new("1", ["Traditional Wings", "Soda"])
                .with_channel("Kiosk")
                .with_customer_type(CustomerType::Guest),
            Order::new("2", ["Fries"]).with_channel("Digital").with_customer_type(CustomerType::Registered),
        ];
        let store = FeatureStore::build(&orders);

        assert!((store.channel_frequency("kiosk", "Soda") - 0.5).abs() < 1e-9);
        assert_eq!(store.channel_frequency("digital", "Soda"), 0.0);
        assert!((store.customer_type_frequency(CustomerType::Registered, "Fries") - 1.0).abs() < 1e-9);
        assert_eq!(store.customer_type_frequency(CustomerType::Special, "Fries"), 0.0);
        assert!((store.platform_frequency(Platform::App, "Fries") - 1.0).abs() < 1e-9);
        assert!((store.platform_frequency(Platform::Kiosk, "Soda") - 0.5).abs() < 1e-9);
        assert_eq!(store.platform_frequency(Platform::Web, "Soda"), 0.0);
    }

    #[test]
    fn unseen_items_are_categorized_by_keyword() {
        let store = FeatureStore::build(&sample_orders());

        assert_eq!(store.category_of("Ranch Dip"), Category::DipsSauces);
        assert_eq!(store.category_of("Mango Habanero Wings"), Category::Wings);
        let item = store.menu_item("Fries");
        assert_eq!(item.category, Category::Fries);
        assert!(item.frequency > 0.0);
    }

    #[test]
    fn normalization_parses_from_config_strings() {
        assert_eq!("per-item".parse(), Ok(CooccurrenceNormalization::PerItem));
        assert_eq!("GLOBAL".parse(), Ok(CooccurrenceNormalization::Global));
        assert!("bayes".parse::<CooccurrenceNormalization>().is_err());
    }
}
