//! Success Metrics
//!
//! Ratio-based business metrics over a batch of shown recommendations and
//! the interactions they produced. Every ratio with a zero denominator is
//! reported as 0.0; the report always has the same shape.

pub mod evaluation;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::category::{categorize, Category};
use crate::domain::interaction::{InteractionAction, InteractionEvent};
use crate::domain::recommendation::{Recommendation, RecommendationType};

/// Number of categories in the menu taxonomy, used to normalize diversification.
pub const CATEGORY_NORMALIZER: f64 = 10.0;

/// Items whose hits count toward session recall.
pub const SESSION_RECALL_K: usize = 3;

/// A recommendation as seen by the metrics calculator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShownItem {
    pub item_name: String,
    /// Derived from the item name when absent.
    #[serde(default)]
    pub category: Option<Category>,
}

impl ShownItem {
    pub fn new(item_name: impl Into<String>) -> Self {
        Self { item_name: item_name.into(), category: None }
    }

    pub fn category(&self) -> Category {
        self.category.unwrap_or_else(|| categorize(&self.item_name))
    }
}

impl From<&Recommendation> for ShownItem {
    fn from(rec: &Recommendation) -> Self {
        Self { item_name: rec.item_name.clone(), category: Some(rec.metadata.category) }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessMetrics {
    pub recommendation_adoption_rate: f64,
    pub click_through_rate: f64,
    pub add_to_cart_rate: f64,
    pub conversion_rate: f64,
    pub average_order_value_lift: f64,
    pub category_diversification: f64,
    pub repeat_recommendation_avoidance: f64,
    pub combo_completion_rate: f64,
    pub premium_item_upsell_rate: f64,
}

impl SuccessMetrics {
    /// Flat name-to-value view of the report.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("recommendation_adoption_rate", self.recommendation_adoption_rate),
            ("click_through_rate", self.click_through_rate),
            ("add_to_cart_rate", self.add_to_cart_rate),
            ("conversion_rate", self.conversion_rate),
            ("average_order_value_lift", self.average_order_value_lift),
            ("category_diversification", self.category_diversification),
            ("repeat_recommendation_avoidance", self.repeat_recommendation_avoidance),
            ("combo_completion_rate", self.combo_completion_rate),
            ("premium_item_upsell_rate", self.premium_item_upsell_rate),
        ])
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub fn measure_success_metrics(
    recommendations: &[ShownItem],
    interactions: &[InteractionEvent],
    baseline_aov: Option<f64>,
) -> SuccessMetrics {
    let mut metrics = SuccessMetrics::default();

    if recommendations.is_empty() || interactions.is_empty() {
        warn!(
            event_name = "metrics.success.empty_input",
            recommendations = recommendations.len(),
            interactions = interactions.len(),
            "no recommendation or interaction data; reporting zeros"
        );
        return metrics;
    }

    let total = recommendations.len();
    let count = |action: InteractionAction| {
        interactions.iter().filter(|event| event.action == action).count()
    };
    let purchases = count(InteractionAction::Purchase);
    let clicks = count(InteractionAction::Click);
    let adds = count(InteractionAction::AddToCart);

    metrics.recommendation_adoption_rate = ratio(purchases, total);
    metrics.click_through_rate = ratio(clicks, total);
    metrics.add_to_cart_rate = ratio(adds, total);
    metrics.conversion_rate = ratio(purchases, clicks);

    if let Some(baseline) = baseline_aov {
        let observed = mean(interactions.iter().map(|event| event.order_value.unwrap_or(0.0)));
        metrics.average_order_value_lift =
            if baseline > 0.0 { (observed - baseline) / baseline } else { 0.0 };
    }

    let combos = interactions
        .iter()
        .filter(|event| event.item_name.to_lowercase().contains("combo"))
        .count();
    metrics.combo_completion_rate = ratio(combos, interactions.len());

    let average_price = mean(interactions.iter().map(|event| event.item_price.unwrap_or(0.0)));
    let premium_purchases = interactions
        .iter()
        .filter(|event| event.action == InteractionAction::Purchase)
        .filter(|event| event.item_price.unwrap_or(0.0) > average_price)
        .count();
    metrics.premium_item_upsell_rate = ratio(premium_purchases, purchases);

    let categories: HashSet<Category> = recommendations.iter().map(ShownItem::category).collect();
    metrics.category_diversification = categories.len() as f64 / CATEGORY_NORMALIZER;

    let unique_items: HashSet<&str> =
        recommendations.iter().map(|item| item.item_name.as_str()).collect();
    metrics.repeat_recommendation_avoidance = ratio(unique_items.len(), total);

    info!(
        event_name = "metrics.success.calculated",
        recommendations = total,
        interactions = interactions.len(),
        adoption_rate = metrics.recommendation_adoption_rate,
        click_through_rate = metrics.click_through_rate,
        "success metrics calculated"
    );

    metrics
}

/// Optional post-order survey answer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerFeedback {
    /// 0-5 star rating.
    pub rating: f64,
    pub would_recommend: bool,
}

/// Quality of one recommendation batch against what the customer ordered.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub recall_at_3: f64,
    /// Unique categories over list length.
    pub diversity_score: f64,
    /// Share of trending and seasonal slots.
    pub freshness_score: f64,
    pub avg_confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_satisfaction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub would_recommend: Option<f64>,
}

pub fn measure_session(
    recommendations: &[Recommendation],
    actual_orders: &[String],
    feedback: Option<CustomerFeedback>,
) -> SessionMetrics {
    let recommended: HashSet<&str> =
        recommendations.iter().map(|rec| rec.item_name.as_str()).collect();
    let ordered: HashSet<&str> = actual_orders.iter().map(String::as_str).collect();
    let hits = recommended.intersection(&ordered).count();
    let recall_at_3 = ratio(hits, SESSION_RECALL_K.min(actual_orders.len())).min(1.0);

    let categories: HashSet<Category> =
        recommendations.iter().map(|rec| rec.metadata.category).collect();
    let promoted = recommendations
        .iter()
        .filter(|rec| {
            matches!(
                rec.recommendation_type,
                RecommendationType::Trending | RecommendationType::Seasonal
            )
        })
        .count();

    SessionMetrics {
        recall_at_3,
        diversity_score: ratio(categories.len(), recommendations.len()),
        freshness_score: ratio(promoted, recommendations.len()),
        avg_confidence: mean(recommendations.iter().map(|rec| rec.confidence_score)),
        customer_satisfaction: feedback.map(|f| f.rating / 5.0),
        would_recommend: feedback.map(|f| if f.would_recommend { 1.0 } else { 0.0 }),
    }
}
