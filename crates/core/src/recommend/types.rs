//! Request and settings types for the recommendation engine

use serde::{Deserialize, Serialize};

use crate::candidates::{BlendWeights, DEFAULT_POPULARITY_TOP_K};
use crate::domain::channel::{CustomerType, Platform};
use crate::errors::DomainError;

/// A single "what else goes with this cart" call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub customer_id: String,
    pub current_items: Vec<String>,
    #[serde(default)]
    pub customer_type: CustomerType,
    pub platform: Platform,
    #[serde(default)]
    pub store_id: Option<String>,
    /// Overrides the platform's target count when set.
    #[serde(default)]
    pub target_count: Option<usize>,
}

impl RecommendationRequest {
    pub fn new(customer_id: impl Into<String>, platform: Platform) -> Self {
        Self {
            customer_id: customer_id.into(),
            current_items: Vec::new(),
            customer_type: CustomerType::default(),
            platform,
            store_id: None,
            target_count: None,
        }
    }

    /// Set the items already in the cart
    pub fn with_current_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.current_items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_customer_type(mut self, customer_type: CustomerType) -> Self {
        self.customer_type = customer_type;
        self
    }

    pub fn with_store_id(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }

    /// Set maximum number of recommendations
    pub fn with_target_count(mut self, count: usize) -> Self {
        self.target_count = Some(count);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.customer_id.trim().is_empty() {
            return Err(DomainError::InvalidInput("customer id must not be empty".to_string()));
        }
        if self.target_count == Some(0) {
            return Err(DomainError::InvalidInput(
                "target count must be at least 1 when provided".to_string(),
            ));
        }
        Ok(())
    }
}

/// Number of recommendations shown per ordering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTargets {
    pub app: usize,
    pub web: usize,
    pub kiosk: usize,
}

impl Default for PlatformTargets {
    fn default() -> Self {
        Self { app: 3, web: 5, kiosk: 3 }
    }
}

impl PlatformTargets {
    pub fn for_platform(&self, platform: Platform) -> usize {
        match platform {
            Platform::App => self.app,
            Platform::Web => self.web,
            Platform::Kiosk => self.kiosk,
        }
    }
}

/// Tunable parameters of the freshness and slotting pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub freshness_window_days: i64,
    pub retention_window_days: i64,
    pub trending_fraction: f64,
    pub seasonal_fraction: f64,
    pub trending_pool_size: usize,
    pub candidate_pool_size: usize,
    pub popularity_top_k: usize,
    pub weights: BlendWeights,
    pub platform_targets: PlatformTargets,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            freshness_window_days: super::DEFAULT_FRESHNESS_WINDOW_DAYS,
            retention_window_days: super::DEFAULT_RETENTION_WINDOW_DAYS,
            trending_fraction: super::DEFAULT_TRENDING_FRACTION,
            seasonal_fraction: super::DEFAULT_SEASONAL_FRACTION,
            trending_pool_size: super::DEFAULT_TRENDING_POOL_SIZE,
            candidate_pool_size: super::DEFAULT_CANDIDATE_POOL_SIZE,
            popularity_top_k: DEFAULT_POPULARITY_TOP_K,
            weights: BlendWeights::default(),
            platform_targets: PlatformTargets::default(),
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.freshness_window_days < 0 {
            return Err(DomainError::InvalidInput(
                "freshness window must not be negative".to_string(),
            ));
        }
        if self.retention_window_days < self.freshness_window_days {
            return Err(DomainError::InvalidInput(
                "retention window must be at least as long as the freshness window".to_string(),
            ));
        }
        if self.retention_window_days > super::MAX_WINDOW_DAYS {
            return Err(DomainError::InvalidInput(format!(
                "retention window must not exceed {} days, got {}",
                super::MAX_WINDOW_DAYS,
                self.retention_window_days
            )));
        }
        for (name, fraction) in
            [("trending_fraction", self.trending_fraction), ("seasonal_fraction", self.seasonal_fraction)]
        {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(DomainError::InvalidInput(format!(
                    "{name} must be within [0, 1], got {fraction}"
                )));
            }
        }
        if self.platform_targets.app == 0
            || self.platform_targets.web == 0
            || self.platform_targets.kiosk == 0
        {
            return Err(DomainError::InvalidInput(
                "platform target counts must be at least 1".to_string(),
            ));
        }
        self.weights.validate()
    }

    /// Slot split for a list of `target` items.
    pub fn slot_plan(&self, target: usize) -> SlotPlan {
        let reserved = |fraction: f64| ((target as f64 * fraction).floor() as usize).max(1);
        let trending = reserved(self.trending_fraction);
        let seasonal = reserved(self.seasonal_fraction);
        SlotPlan { base: target.saturating_sub(trending + seasonal), trending, seasonal }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPlan {
    pub base: usize,
    pub trending: usize,
    pub seasonal: usize,
}
