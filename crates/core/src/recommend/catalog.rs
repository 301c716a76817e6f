//! Promotional item lists: trending, seasonal and fallback

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::item::MenuItem;

const DEFAULT_TRENDING: &[&str] = &[
    "Honey BBQ Wings",
    "Spicy Chicken Sandwich",
    "Buffalo Cauliflower",
    "Lemon Pepper Wings",
    "Cajun Fries",
    "Mango Habanero Wings",
    "Garlic Parmesan Wings",
];

const DEFAULT_SEASONAL: &[(u32, &[&str])] = &[
    (1, &["New Year Combo", "Detox Salad"]),
    (12, &["Holiday Wings Special", "Peppermint Shake"]),
];

const DEFAULT_SEASONAL_FALLBACK: &[&str] = &["Summer Special Wings"];

const DEFAULT_FALLBACK: &[&str] = &["Buffalo Wings", "French Fries", "Soft Drink"];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromotionCatalog {
    /// Ordered by current momentum; the head of this list forms the sampling pool.
    pub trending: Vec<String>,
    /// Calendar month (1-12) to featured items.
    pub seasonal: BTreeMap<u32, Vec<String>>,
    /// Used for months without an entry.
    pub seasonal_default: Vec<String>,
    /// Fixed popular items used to backfill short lists.
    pub fallback: Vec<String>,
}

impl Default for PromotionCatalog {
    fn default() -> Self {
        Self {
            trending: owned(DEFAULT_TRENDING),
            seasonal: DEFAULT_SEASONAL
                .iter()
                .map(|(month, items)| (*month, owned(items)))
                .collect(),
            seasonal_default: owned(DEFAULT_SEASONAL_FALLBACK),
            fallback: owned(DEFAULT_FALLBACK),
        }
    }
}

impl PromotionCatalog {
    pub fn with_trending(mut self, items: Vec<String>) -> Self {
        self.trending = items;
        self
    }

    pub fn with_seasonal_month(mut self, month: u32, items: Vec<String>) -> Self {
        self.seasonal.insert(month, items);
        self
    }

    pub fn with_seasonal_default(mut self, items: Vec<String>) -> Self {
        self.seasonal_default = items;
        self
    }

    pub fn with_fallback(mut self, items: Vec<String>) -> Self {
        self.fallback = items;
        self
    }

    /// First `pool_size` trending items that are not excluded.
    pub fn trending_pool(&self, exclude: &HashSet<String>, pool_size: usize) -> Vec<&str> {
        let mut pool = eligible(&self.trending, exclude);
        pool.truncate(pool_size);
        pool
    }

    pub fn seasonal_items(&self, month: u32, exclude: &HashSet<String>) -> Vec<&str> {
        eligible(self.seasonal_for(month), exclude)
    }

    pub fn fallback_items(&self, exclude: &HashSet<String>) -> Vec<&str> {
        eligible(&self.fallback, exclude)
    }

    /// Sets the promotion flags of `item` from catalog membership in `month`.
    pub fn annotate(&self, mut item: MenuItem, month: u32) -> MenuItem {
        item.is_trending = self.trending.contains(&item.name);
        item.is_seasonal = self.seasonal_for(month).contains(&item.name);
        item
    }

    fn seasonal_for(&self, month: u32) -> &[String] {
        self.seasonal.get(&month).unwrap_or(&self.seasonal_default)
    }
}

fn eligible<'a>(items: &'a [String], exclude: &HashSet<String>) -> Vec<&'a str> {
    items.iter().filter(|item| !exclude.contains(*item)).map(String::as_str).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::PromotionCatalog;
    use crate::features::FeatureStore;

    fn exclude(items: &[&str]) -> HashSet<String> {
        items.iter().map(|item| (*item).to_string()).collect()
    }

    #[test]
    fn seasonal_items_follow_calendar_month() {
        let catalog = PromotionCatalog::default();

        assert_eq!(catalog.seasonal_items(12, &HashSet::new()), vec!["Holiday Wings Special", "Peppermint Shake"]);
        assert_eq!(catalog.seasonal_items(1, &exclude(&["Detox Salad"])), vec!["New Year Combo"]);
        assert_eq!(catalog.seasonal_items(7, &HashSet::new()), vec!["Summer Special Wings"]);
    }

    #[test]
    fn trending_pool_skips_excluded_and_caps_size() {
        let catalog = PromotionCatalog::default();

        let pool = catalog.trending_pool(&exclude(&["Honey BBQ Wings"]), 3);
        assert_eq!(pool, vec!["Spicy Chicken Sandwich", "Buffalo Cauliflower", "Lemon Pepper Wings"]);
    }

    #[test]
    fn annotate_flags_trending_and_in_season_items() {
        let catalog = PromotionCatalog::default();
        let features = FeatureStore::build(&[]);

        let honey = catalog.annotate(features.menu_item("Honey BBQ Wings"), 6);
        assert!(honey.is_trending);
        assert!(!honey.is_seasonal);

        let holiday = catalog.annotate(features.menu_item("Holiday Wings Special"), 12);
        assert!(holiday.is_seasonal);
        assert!(!catalog.annotate(features.menu_item("Holiday Wings Special"), 6).is_seasonal);
        assert!(catalog.annotate(features.menu_item("Summer Special Wings"), 6).is_seasonal);
    }

    #[test]
    fn fallback_can_be_exhausted() {
        let catalog = PromotionCatalog::default();

        let remaining =
            catalog.fallback_items(&exclude(&["Buffalo Wings", "French Fries", "Soft Drink"]));
        assert!(remaining.is_empty());
    }
}
