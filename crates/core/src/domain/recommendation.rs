use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::category::Category;
use crate::domain::channel::{CustomerType, Platform};

/// Which slot family produced a recommendation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Personalized,
    Trending,
    Seasonal,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personalized => "personalized",
            Self::Trending => "trending",
            Self::Seasonal => "seasonal",
        }
    }

    pub fn explain(&self, item_name: &str) -> String {
        match self {
            Self::Personalized => {
                format!("Based on your preferences, customers like you often enjoy {item_name}")
            }
            Self::Trending => format!("{item_name} is trending with our guests right now"),
            Self::Seasonal => {
                format!("{item_name} is a seasonal favorite perfect for this time of year")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationMetadata {
    pub category: Category,
    pub is_combo: bool,
    pub is_wings: bool,
    pub is_trending: bool,
    pub is_seasonal: bool,
    /// 1.0 when the item was not shown to this customer inside the retention
    /// window, otherwise the fraction of that window elapsed since it was.
    pub freshness_score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_name: String,
    /// 1-based position in the returned list.
    pub rank: usize,
    pub recommendation_type: RecommendationType,
    pub platform: Platform,
    pub store_id: Option<String>,
    pub customer_type: CustomerType,
    pub confidence_score: f64,
    pub explanation: String,
    pub metadata: RecommendationMetadata,
}

/// Output of a single recommendation call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBatch {
    pub request_id: Uuid,
    pub customer_id: String,
    pub generated_at: DateTime<Utc>,
    pub recommendations: Vec<Recommendation>,
}

impl RecommendationBatch {
    pub fn item_names(&self) -> Vec<&str> {
        self.recommendations.iter().map(|rec| rec.item_name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.recommendations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}
