//! Deterministic A/B variant assignment

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::DomainError;

pub const CONTROL_VARIANT: &str = "control";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Fraction of customers (0..=1) eligible for a test variant.
    pub test_percentage: f64,
    pub variants: Vec<String>,
    pub seed: String,
    pub metrics_to_track: Vec<String>,
    pub minimum_sample_size: u32,
    pub test_duration_days: u32,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            test_percentage: 0.1,
            variants: vec![
                CONTROL_VARIANT.to_string(),
                "enhanced_personalization".to_string(),
                "freshness_boost".to_string(),
            ],
            seed: "default".to_string(),
            metrics_to_track: vec![
                "click_through_rate".to_string(),
                "conversion_rate".to_string(),
                "average_order_value".to_string(),
                "customer_satisfaction".to_string(),
                "recommendation_accuracy".to_string(),
            ],
            minimum_sample_size: 1000,
            test_duration_days: 14,
        }
    }
}

impl ExperimentConfig {
    pub fn new(test_percentage: f64) -> Result<Self, DomainError> {
        let config = Self { test_percentage, ..Self::default() };
        config.validate()?;
        Ok(config)
    }

    pub fn with_variants(mut self, variants: Vec<String>) -> Self {
        self.variants = variants;
        self
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = seed.into();
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=1.0).contains(&self.test_percentage) {
            return Err(DomainError::InvalidInput(format!(
                "test percentage must be within [0, 1], got {}",
                self.test_percentage
            )));
        }
        if self.variants.is_empty() {
            return Err(DomainError::InvalidInput("experiment needs at least one variant".to_string()));
        }
        Ok(())
    }

    /// Equal traffic share per variant.
    pub fn allocation(&self) -> Vec<(&str, f64)> {
        let share = if self.variants.is_empty() { 0.0 } else { 1.0 / self.variants.len() as f64 };
        self.variants.iter().map(|variant| (variant.as_str(), share)).collect()
    }

    /// Stable variant for `customer_id`: the same customer and seed always
    /// land in the same bucket.
    pub fn assign_variant(&self, customer_id: &str) -> &str {
        let hash = bucket_hash(customer_id, &self.seed);
        let bucket = (hash % 100) as f64 / 100.0;
        if bucket > self.test_percentage || self.variants.is_empty() {
            return CONTROL_VARIANT;
        }
        let index = (hash % self.variants.len() as u128) as usize;
        &self.variants[index]
    }
}

/// Leading 128 bits of SHA-256 over `"{customer_id}_{seed}"`.
fn bucket_hash(customer_id: &str, seed: &str) -> u128 {
    let digest = Sha256::digest(format!("{customer_id}_{seed}").as_bytes());
    let mut leading = [0u8; 16];
    leading.copy_from_slice(&digest[..16]);
    u128::from_be_bytes(leading)
}
