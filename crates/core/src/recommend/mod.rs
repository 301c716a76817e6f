//! Freshness-aware Recommendation Engine
//!
//! Turns blended candidate scores plus each customer's recent recommendation
//! history into a ranked, category-diverse list with reserved trending and
//! seasonal slots. Every call records what it returned so the next call can
//! avoid repeating it.

mod baseline;
mod catalog;
mod diversity;
mod engine;
mod history;
mod random;
mod types;

pub use baseline::BaselineRecommender;
pub use catalog::PromotionCatalog;
pub use diversity::diversify;
pub use engine::RecommendationEngine;
pub use history::{HistoryEntry, HistoryStore, InMemoryHistoryStore};
pub use random::{FirstN, RandomSource, SeededRandom};
pub use types::{EngineSettings, PlatformTargets, RecommendationRequest, SlotPlan};

/// Items shown within this many days are withheld from new lists
pub const DEFAULT_FRESHNESS_WINDOW_DAYS: i64 = 7;

/// History older than this many days is pruned
pub const DEFAULT_RETENTION_WINDOW_DAYS: i64 = 30;

/// Upper bound for both windows, roughly ten years
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Share of slots reserved for trending items (at least one)
pub const DEFAULT_TRENDING_FRACTION: f64 = 0.2;

/// Share of slots reserved for seasonal items (at least one)
pub const DEFAULT_SEASONAL_FRACTION: f64 = 0.1;

/// Trending items eligible for random sampling
pub const DEFAULT_TRENDING_POOL_SIZE: usize = 10;

/// Blended candidates considered before freshness filtering
pub const DEFAULT_CANDIDATE_POOL_SIZE: usize = 20;

/// List length produced by the baseline recommender
pub const DEFAULT_BASELINE_TOP_K: usize = 3;

pub const TRENDING_CONFIDENCE: f64 = 0.7;
pub const SEASONAL_CONFIDENCE: f64 = 0.6;
pub const FALLBACK_CONFIDENCE: f64 = 0.4;
