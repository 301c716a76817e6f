pub mod candidates;
pub mod config;
pub mod domain;
pub mod errors;
pub mod features;
pub mod metrics;
pub mod pilot;
pub mod recommend;

pub use candidates::{BlendWeights, CandidateGenerator, GeneratorKind, ScoreBlender, ScoredItem};
pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat};
pub use domain::category::Category;
pub use domain::channel::{CustomerType, Platform};
pub use domain::interaction::{InteractionAction, InteractionEvent};
pub use domain::item::MenuItem;
pub use domain::order::Order;
pub use domain::recommendation::{Recommendation, RecommendationBatch, RecommendationType};
pub use errors::{ApplicationError, DomainError};
pub use features::{CooccurrenceNormalization, FeatureOptions, FeatureStore};
pub use metrics::{measure_session, measure_success_metrics, SessionMetrics, SuccessMetrics};
pub use pilot::{calculate_roi, monitor_health, ExperimentConfig, HealthReport, RoiAnalysis};
pub use recommend::{
    BaselineRecommender, EngineSettings, HistoryStore, InMemoryHistoryStore,
    PromotionCatalog, RecommendationEngine, RecommendationRequest, SeededRandom,
};
