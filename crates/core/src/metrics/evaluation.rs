//! Offline evaluation of batch predictions against held-out items

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Most-recommended items listed in a pattern analysis.
pub const MOST_RECOMMENDED_LIMIT: usize = 10;

/// Share of rows whose held-out item appears among the first `k` predictions.
///
/// Matching is case-insensitive and whitespace-trimmed. Rows without a
/// held-out item count as misses. Mismatched input lengths score 0.0.
pub fn recall_at_k(predictions: &[Vec<String>], ground_truth: &[Option<String>], k: usize) -> f64 {
    if predictions.len() != ground_truth.len() {
        warn!(
            event_name = "evaluation.recall.length_mismatch",
            predictions = predictions.len(),
            ground_truth = ground_truth.len(),
            "prediction and ground-truth lengths differ"
        );
        return 0.0;
    }
    if predictions.is_empty() {
        return 0.0;
    }

    let correct = predictions
        .iter()
        .zip(ground_truth)
        .filter(|(predicted, truth)| {
            let Some(truth) = truth else {
                return false;
            };
            let truth = truth.trim().to_lowercase();
            predicted.iter().take(k).any(|item| item.trim().to_lowercase() == truth)
        })
        .count();

    correct as f64 / predictions.len() as f64
}

/// With exactly one held-out item per row, precision@k equals recall@k.
pub fn precision_at_k(predictions: &[Vec<String>], ground_truth: &[Option<String>], k: usize) -> f64 {
    recall_at_k(predictions, ground_truth, k)
}

pub fn hit_rate(predictions: &[Vec<String>], ground_truth: &[Option<String>], k: usize) -> f64 {
    recall_at_k(predictions, ground_truth, k)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    /// (item, times recommended), most frequent first, ties by name.
    pub most_recommended: Vec<(String, usize)>,
    /// Unique items over total recommendations.
    pub diversity: f64,
    /// Number of distinct items recommended.
    pub coverage: usize,
}

pub fn analyze_patterns(predictions: &[Vec<String>]) -> PatternAnalysis {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut total = 0usize;
    for item in predictions.iter().flatten() {
        *counts.entry(item.as_str()).or_insert(0) += 1;
        total += 1;
    }

    let coverage = counts.len();
    let mut most_recommended: Vec<(String, usize)> =
        counts.into_iter().map(|(item, count)| (item.to_string(), count)).collect();
    most_recommended.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    most_recommended.truncate(MOST_RECOMMENDED_LIMIT);

    PatternAnalysis {
        most_recommended,
        diversity: if total == 0 { 0.0 } else { coverage as f64 / total as f64 },
        coverage,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub predictions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recall_at_k: Option<f64>,
    pub patterns: PatternAnalysis,
}

/// Pattern analysis always; recall only when held-out items are supplied.
pub fn evaluate(
    predictions: &[Vec<String>],
    ground_truth: Option<&[Option<String>]>,
    k: usize,
) -> EvaluationReport {
    let recall = ground_truth.map(|truth| recall_at_k(predictions, truth, k));
    let patterns = analyze_patterns(predictions);

    info!(
        event_name = "evaluation.report.generated",
        predictions = predictions.len(),
        k,
        coverage = patterns.coverage,
        "offline evaluation finished"
    );

    EvaluationReport { k, predictions: predictions.len(), recall_at_k: recall, patterns }
}
