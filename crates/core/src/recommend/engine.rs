//! Recommendation Engine implementation

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::catalog::PromotionCatalog;
use super::diversity::diversify;
use super::history::{HistoryEntry, HistoryStore, InMemoryHistoryStore};
use super::random::{RandomSource, SeededRandom};
use super::types::{EngineSettings, RecommendationRequest};
use super::{FALLBACK_CONFIDENCE, SEASONAL_CONFIDENCE, TRENDING_CONFIDENCE};
use crate::candidates::{default_generators, ScoreBlender};
use crate::domain::item::MenuItem;
use crate::domain::recommendation::{
    Recommendation, RecommendationBatch, RecommendationMetadata, RecommendationType,
};
use crate::errors::{ApplicationError, DomainError};
use crate::features::FeatureStore;

/// Where a picked item came from.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    /// Blended score relative to the best fresh candidate.
    Personalized { relative: f64 },
    Trending,
    Seasonal,
    Fallback,
}

impl Slot {
    fn recommendation_type(&self) -> RecommendationType {
        match self {
            Self::Trending => RecommendationType::Trending,
            Self::Seasonal => RecommendationType::Seasonal,
            Self::Personalized { .. } | Self::Fallback => RecommendationType::Personalized,
        }
    }
}

/// Picked items in output order plus everything that must not be picked again.
struct Selection {
    picks: Vec<(String, Slot)>,
    taken: HashSet<String>,
}

impl Selection {
    fn new(cart: &[String]) -> Self {
        Self { picks: Vec::new(), taken: cart.iter().cloned().collect() }
    }

    fn push(&mut self, item: &str, slot: Slot) -> bool {
        if !self.taken.insert(item.to_string()) {
            return false;
        }
        self.picks.push((item.to_string(), slot));
        true
    }

    fn len(&self) -> usize {
        self.picks.len()
    }
}

/// The main recommendation engine
pub struct RecommendationEngine {
    features: Arc<FeatureStore>,
    blender: ScoreBlender,
    catalog: PromotionCatalog,
    settings: EngineSettings,
    history: Arc<dyn HistoryStore>,
    random: Mutex<Box<dyn RandomSource>>,
    customer_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RecommendationEngine {
    /// Create an engine with default settings, an empty in-memory history and
    /// an entropy-seeded random source
    pub fn new(features: impl Into<Arc<FeatureStore>>) -> Self {
        Self {
            features: features.into(),
            blender: ScoreBlender::new(),
            catalog: PromotionCatalog::default(),
            settings: EngineSettings::default(),
            history: Arc::new(InMemoryHistoryStore::new()),
            random: Mutex::new(Box::new(SeededRandom::from_entropy())),
            customer_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create with custom settings
    pub fn from_settings(
        features: impl Into<Arc<FeatureStore>>,
        settings: EngineSettings,
    ) -> Result<Self, DomainError> {
        settings.validate()?;
        let blender = ScoreBlender::with_weights(settings.weights)
            .with_generators(default_generators(settings.popularity_top_k));
        Ok(Self { blender, settings, ..Self::new(features) })
    }

    pub fn with_catalog(mut self, catalog: PromotionCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_history_store(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = history;
        self
    }

    pub fn with_random_source(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Mutex::new(Box::new(random));
        self
    }

    pub fn features(&self) -> &FeatureStore {
        &self.features
    }

    /// Derived attributes of `name` with promotion flags for `month`.
    pub fn menu_item(&self, name: &str, month: u32) -> MenuItem {
        self.catalog.annotate(self.features.menu_item(name), month)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    pub fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationBatch, ApplicationError> {
        self.recommend_at(request, Utc::now())
    }

    /// Produce a batch as of `now` and record it in the customer's history.
    ///
    /// Concurrent calls for the same customer are serialized so that the
    /// read-filter-append sequence never loses an update.
    pub fn recommend_at(
        &self,
        request: &RecommendationRequest,
        now: DateTime<Utc>,
    ) -> Result<RecommendationBatch, ApplicationError> {
        request.validate()?;
        let target = request
            .target_count
            .unwrap_or_else(|| self.settings.platform_targets.for_platform(request.platform));

        let customer_lock = self.customer_lock(&request.customer_id)?;
        let _guard = customer_lock.lock().map_err(|_| {
            ApplicationError::HistoryStore(format!(
                "customer lock for `{}` poisoned by a panicked call",
                request.customer_id
            ))
        })?;

        let retention_start = window_start(now, self.settings.retention_window_days)?;
        let freshness_start = window_start(now, self.settings.freshness_window_days)?;
        let retained = self.history.get_recent(&request.customer_id, retention_start)?;

        let recent: HashSet<String> = retained
            .iter()
            .filter(|entry| entry.recommended_at >= freshness_start)
            .map(|entry| entry.item_name.clone())
            .collect();
        let mut last_shown: HashMap<&str, DateTime<Utc>> = HashMap::new();
        for entry in &retained {
            let seen = last_shown.entry(entry.item_name.as_str()).or_insert(entry.recommended_at);
            if entry.recommended_at > *seen {
                *seen = entry.recommended_at;
            }
        }

        let selection = self.select(request, target, &recent, now)?;

        let recommendations: Vec<Recommendation> = selection
            .picks
            .iter()
            .enumerate()
            .map(|(index, (item, slot))| {
                let freshness = self.freshness_score(last_shown.get(item.as_str()).copied(), now);
                self.build_recommendation(request, index + 1, item, *slot, freshness, now.month())
            })
            .collect();

        let entries: Vec<HistoryEntry> =
            recommendations.iter().map(|rec| HistoryEntry::new(rec.item_name.clone(), now)).collect();
        self.history.append(&request.customer_id, &entries)?;
        self.history.prune(&request.customer_id, retention_start)?;

        info!(
            event_name = "engine.recommend.completed",
            customer_id = %request.customer_id,
            platform = request.platform.as_str(),
            target,
            returned = recommendations.len(),
            withheld_recent = recent.len(),
            "recommendation batch generated"
        );

        Ok(RecommendationBatch {
            request_id: Uuid::new_v4(),
            customer_id: request.customer_id.clone(),
            generated_at: now,
            recommendations,
        })
    }

    fn select(
        &self,
        request: &RecommendationRequest,
        target: usize,
        recent: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Result<Selection, ApplicationError> {
        let cart = &request.current_items;
        let cart_set: HashSet<String> = cart.iter().cloned().collect();

        let ranked =
            self.blender.rank(&self.features, cart, &cart_set, self.settings.candidate_pool_size);
        let fresh: Vec<_> =
            ranked.into_iter().filter(|candidate| !recent.contains(&candidate.item_name)).collect();
        let top_score = fresh.first().map(|candidate| candidate.score).unwrap_or(0.0);
        let relative =
            |score: f64| if top_score > 0.0 { (score / top_score).min(1.0) } else { 0.0 };
        let pool = diversify(&fresh, &self.features, target);
        let plan = self.settings.slot_plan(target);

        let mut selection = Selection::new(cart);
        for candidate in pool.iter().take(plan.base) {
            let slot = Slot::Personalized { relative: relative(candidate.score) };
            selection.push(&candidate.item_name, slot);
        }

        // Promotional slots skip the whole diversity pool, not just the base picks.
        let mut blocked: HashSet<String> = selection.taken.union(recent).cloned().collect();
        blocked.extend(pool.iter().map(|candidate| candidate.item_name.clone()));

        let trending_pool = self.catalog.trending_pool(&blocked, self.settings.trending_pool_size);
        let draws = {
            let mut random = self.random.lock().map_err(|_| {
                DomainError::InvariantViolation("random source lock poisoned".to_string())
            })?;
            random.sample(trending_pool.len(), plan.trending)
        };
        let trending: Vec<String> =
            draws.into_iter().filter_map(|index| trending_pool.get(index)).map(|item| item.to_string()).collect();
        for item in &trending {
            selection.push(item, Slot::Trending);
            blocked.insert(item.clone());
        }

        let seasonal: Vec<String> = self
            .catalog
            .seasonal_items(now.month(), &blocked)
            .into_iter()
            .take(plan.seasonal)
            .map(str::to_string)
            .collect();
        for item in &seasonal {
            selection.push(item, Slot::Seasonal);
        }

        // Unused fresh candidates go ahead of any fallback item.
        for candidate in pool.iter().skip(plan.base).chain(fresh.iter()) {
            if selection.len() >= target {
                break;
            }
            let slot = Slot::Personalized { relative: relative(candidate.score) };
            selection.push(&candidate.item_name, slot);
        }

        self.backfill(&mut selection, target, recent);
        selection.picks.truncate(target);

        debug!(
            event_name = "engine.selection.completed",
            customer_id = %request.customer_id,
            candidates = fresh.len(),
            base = plan.base,
            trending = trending.len(),
            seasonal = seasonal.len(),
            total = selection.len(),
            "slots filled"
        );
        Ok(selection)
    }

    /// Fresh fallback items first; recently shown ones only when nothing else is left.
    fn backfill(&self, selection: &mut Selection, target: usize, recent: &HashSet<String>) {
        for allow_recent in [false, true] {
            if selection.len() >= target {
                return;
            }
            let mut exclude = selection.taken.clone();
            if !allow_recent {
                exclude.extend(recent.iter().cloned());
            }
            let candidates: Vec<String> =
                self.catalog.fallback_items(&exclude).into_iter().map(str::to_string).collect();
            for item in candidates {
                if selection.len() >= target {
                    return;
                }
                selection.push(&item, Slot::Fallback);
            }
        }
    }

    fn freshness_score(&self, last_shown: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        let Some(shown_at) = last_shown else {
            return 1.0;
        };
        let retention_days = self.settings.retention_window_days;
        if retention_days <= 0 {
            return 1.0;
        }
        let elapsed = (now - shown_at).num_seconds() as f64 / 86_400.0;
        (elapsed / retention_days as f64).clamp(0.0, 1.0)
    }

    fn confidence(&self, request: &RecommendationRequest, item: &str, slot: Slot) -> f64 {
        match slot {
            Slot::Personalized { relative } => {
                let segment = self
                    .features
                    .customer_type_frequency(request.customer_type, item)
                    .max(self.features.platform_frequency(request.platform, item));
                (0.5 + 0.4 * relative + segment.min(0.1)).clamp(0.0, 1.0)
            }
            Slot::Trending => TRENDING_CONFIDENCE,
            Slot::Seasonal => SEASONAL_CONFIDENCE,
            Slot::Fallback => FALLBACK_CONFIDENCE,
        }
    }

    fn build_recommendation(
        &self,
        request: &RecommendationRequest,
        rank: usize,
        item: &str,
        slot: Slot,
        freshness_score: f64,
        month: u32,
    ) -> Recommendation {
        let recommendation_type = slot.recommendation_type();
        let menu_item = self.menu_item(item, month);

        Recommendation {
            item_name: item.to_string(),
            rank,
            recommendation_type,
            platform: request.platform,
            store_id: request.store_id.clone(),
            customer_type: request.customer_type,
            confidence_score: self.confidence(request, item, slot),
            explanation: recommendation_type.explain(item),
            metadata: RecommendationMetadata {
                category: menu_item.category,
                is_combo: menu_item.is_combo(),
                is_wings: menu_item.is_wings(),
                is_trending: slot == Slot::Trending,
                is_seasonal: slot == Slot::Seasonal,
                freshness_score,
            },
        }
    }

    fn customer_lock(&self, customer_id: &str) -> Result<Arc<Mutex<()>>, ApplicationError> {
        let mut locks = self.customer_locks.lock().map_err(|_| {
            ApplicationError::HistoryStore("customer lock table poisoned".to_string())
        })?;
        Ok(Arc::clone(locks.entry(customer_id.to_string()).or_default()))
    }
}

fn window_start(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, DomainError> {
    Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| DomainError::InvalidInput(format!("window of {days} days is out of range")))
}

impl std::fmt::Debug for RecommendationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationEngine")
            .field("blender", &self.blender)
            .field("settings", &self.settings)
            .field("orders", &self.features.order_count())
            .finish_non_exhaustive()
    }
}
