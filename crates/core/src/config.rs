use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::candidates::{
    default_generators, BlendWeights, ScoreBlender, DEFAULT_POPULARITY_TOP_K,
};
use crate::features::{
    CooccurrenceNormalization, FeatureOptions, FeatureStore, DEFAULT_MAX_RULES_PER_ITEM,
    DEFAULT_MIN_RULE_CONFIDENCE,
};
use crate::recommend::{
    BaselineRecommender, EngineSettings, PlatformTargets, PromotionCatalog, DEFAULT_BASELINE_TOP_K,
    DEFAULT_CANDIDATE_POOL_SIZE, DEFAULT_FRESHNESS_WINDOW_DAYS, DEFAULT_RETENTION_WINDOW_DAYS,
    DEFAULT_SEASONAL_FRACTION, DEFAULT_TRENDING_FRACTION, DEFAULT_TRENDING_POOL_SIZE,
    MAX_WINDOW_DAYS,
};

pub const DEFAULT_CONFIG_FILE: &str = "cartwise.toml";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub weights: BlendWeights,
    pub features: FeaturesConfig,
    pub platforms: PlatformTargets,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub freshness_window_days: i64,
    pub retention_window_days: i64,
    pub trending_fraction: f64,
    pub seasonal_fraction: f64,
    pub trending_pool_size: usize,
    pub candidate_pool_size: usize,
    pub baseline_top_k: usize,
    /// Unset means the random source is seeded from entropy.
    pub random_seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeaturesConfig {
    pub cooccurrence_normalization: CooccurrenceNormalization,
    pub min_rule_confidence: f64,
    pub max_rules_per_item: usize,
    pub popularity_top_k: usize,
}

/// Optional replacements for the built-in promotion lists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogConfig {
    pub trending: Option<Vec<String>>,
    pub seasonal_default: Option<Vec<String>>,
    pub fallback: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub random_seed: Option<u64>,
    pub cooccurrence_normalization: Option<CooccurrenceNormalization>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                freshness_window_days: DEFAULT_FRESHNESS_WINDOW_DAYS,
                retention_window_days: DEFAULT_RETENTION_WINDOW_DAYS,
                trending_fraction: DEFAULT_TRENDING_FRACTION,
                seasonal_fraction: DEFAULT_SEASONAL_FRACTION,
                trending_pool_size: DEFAULT_TRENDING_POOL_SIZE,
                candidate_pool_size: DEFAULT_CANDIDATE_POOL_SIZE,
                baseline_top_k: DEFAULT_BASELINE_TOP_K,
                random_seed: None,
            },
            weights: BlendWeights::default(),
            features: FeaturesConfig {
                cooccurrence_normalization: CooccurrenceNormalization::Global,
                min_rule_confidence: DEFAULT_MIN_RULE_CONFIDENCE,
                max_rules_per_item: DEFAULT_MAX_RULES_PER_ITEM,
                popularity_top_k: DEFAULT_POPULARITY_TOP_K,
            },
            platforms: PlatformTargets::default(),
            catalog: CatalogConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Engine tunables as consumed by `RecommendationEngine::from_settings`.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            freshness_window_days: self.engine.freshness_window_days,
            retention_window_days: self.engine.retention_window_days,
            trending_fraction: self.engine.trending_fraction,
            seasonal_fraction: self.engine.seasonal_fraction,
            trending_pool_size: self.engine.trending_pool_size,
            candidate_pool_size: self.engine.candidate_pool_size,
            popularity_top_k: self.features.popularity_top_k,
            weights: self.weights,
            platform_targets: self.platforms,
        }
    }

    /// History-free comparison recommender sharing the engine's weights and catalog.
    pub fn baseline_recommender(
        &self,
        features: impl Into<Arc<FeatureStore>>,
    ) -> BaselineRecommender {
        let blender = ScoreBlender::with_weights(self.weights)
            .with_generators(default_generators(self.features.popularity_top_k));
        BaselineRecommender::new(features)
            .with_blender(blender)
            .with_catalog(self.promotion_catalog())
            .with_top_k(self.engine.baseline_top_k)
    }

    pub fn feature_options(&self) -> FeatureOptions {
        FeatureOptions {
            normalization: self.features.cooccurrence_normalization,
            min_rule_confidence: self.features.min_rule_confidence,
            max_rules_per_item: self.features.max_rules_per_item,
        }
    }

    pub fn promotion_catalog(&self) -> PromotionCatalog {
        let mut catalog = PromotionCatalog::default();
        if let Some(trending) = &self.catalog.trending {
            catalog = catalog.with_trending(trending.clone());
        }
        if let Some(seasonal_default) = &self.catalog.seasonal_default {
            catalog = catalog.with_seasonal_default(seasonal_default.clone());
        }
        if let Some(fallback) = &self.catalog.fallback {
            catalog = catalog.with_fallback(fallback.clone());
        }
        catalog
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(engine) = patch.engine {
            if let Some(days) = engine.freshness_window_days {
                self.engine.freshness_window_days = days;
            }
            if let Some(days) = engine.retention_window_days {
                self.engine.retention_window_days = days;
            }
            if let Some(fraction) = engine.trending_fraction {
                self.engine.trending_fraction = fraction;
            }
            if let Some(fraction) = engine.seasonal_fraction {
                self.engine.seasonal_fraction = fraction;
            }
            if let Some(size) = engine.trending_pool_size {
                self.engine.trending_pool_size = size;
            }
            if let Some(size) = engine.candidate_pool_size {
                self.engine.candidate_pool_size = size;
            }
            if let Some(top_k) = engine.baseline_top_k {
                self.engine.baseline_top_k = top_k;
            }
            if let Some(seed) = engine.random_seed {
                self.engine.random_seed = Some(seed);
            }
        }

        if let Some(weights) = patch.weights {
            if let Some(weight) = weights.cooccurrence {
                self.weights.cooccurrence = weight;
            }
            if let Some(weight) = weights.market_basket {
                self.weights.market_basket = weight;
            }
            if let Some(weight) = weights.category {
                self.weights.category = weight;
            }
            if let Some(weight) = weights.popularity {
                self.weights.popularity = weight;
            }
        }

        if let Some(features) = patch.features {
            if let Some(normalization) = features.cooccurrence_normalization {
                self.features.cooccurrence_normalization = normalization;
            }
            if let Some(confidence) = features.min_rule_confidence {
                self.features.min_rule_confidence = confidence;
            }
            if let Some(max_rules) = features.max_rules_per_item {
                self.features.max_rules_per_item = max_rules;
            }
            if let Some(top_k) = features.popularity_top_k {
                self.features.popularity_top_k = top_k;
            }
        }

        if let Some(platforms) = patch.platforms {
            if let Some(count) = platforms.app {
                self.platforms.app = count;
            }
            if let Some(count) = platforms.web {
                self.platforms.web = count;
            }
            if let Some(count) = platforms.kiosk {
                self.platforms.kiosk = count;
            }
        }

        if let Some(catalog) = patch.catalog {
            if catalog.trending.is_some() {
                self.catalog.trending = catalog.trending;
            }
            if catalog.seasonal_default.is_some() {
                self.catalog.seasonal_default = catalog.seasonal_default;
            }
            if catalog.fallback.is_some() {
                self.catalog.fallback = catalog.fallback;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CARTWISE_ENGINE_FRESHNESS_WINDOW_DAYS") {
            self.engine.freshness_window_days =
                parse_i64("CARTWISE_ENGINE_FRESHNESS_WINDOW_DAYS", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_ENGINE_RETENTION_WINDOW_DAYS") {
            self.engine.retention_window_days =
                parse_i64("CARTWISE_ENGINE_RETENTION_WINDOW_DAYS", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_ENGINE_TRENDING_FRACTION") {
            self.engine.trending_fraction = parse_f64("CARTWISE_ENGINE_TRENDING_FRACTION", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_ENGINE_SEASONAL_FRACTION") {
            self.engine.seasonal_fraction = parse_f64("CARTWISE_ENGINE_SEASONAL_FRACTION", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_ENGINE_TRENDING_POOL_SIZE") {
            self.engine.trending_pool_size =
                parse_usize("CARTWISE_ENGINE_TRENDING_POOL_SIZE", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_ENGINE_CANDIDATE_POOL_SIZE") {
            self.engine.candidate_pool_size =
                parse_usize("CARTWISE_ENGINE_CANDIDATE_POOL_SIZE", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_ENGINE_BASELINE_TOP_K") {
            self.engine.baseline_top_k = parse_usize("CARTWISE_ENGINE_BASELINE_TOP_K", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_ENGINE_RANDOM_SEED") {
            self.engine.random_seed = Some(parse_u64("CARTWISE_ENGINE_RANDOM_SEED", &value)?);
        }

        if let Some(value) = read_env("CARTWISE_WEIGHTS_COOCCURRENCE") {
            self.weights.cooccurrence = parse_f64("CARTWISE_WEIGHTS_COOCCURRENCE", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_WEIGHTS_MARKET_BASKET") {
            self.weights.market_basket = parse_f64("CARTWISE_WEIGHTS_MARKET_BASKET", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_WEIGHTS_CATEGORY") {
            self.weights.category = parse_f64("CARTWISE_WEIGHTS_CATEGORY", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_WEIGHTS_POPULARITY") {
            self.weights.popularity = parse_f64("CARTWISE_WEIGHTS_POPULARITY", &value)?;
        }

        if let Some(value) = read_env("CARTWISE_FEATURES_COOCCURRENCE_NORMALIZATION") {
            self.features.cooccurrence_normalization =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "CARTWISE_FEATURES_COOCCURRENCE_NORMALIZATION".to_string(),
                    value: value.clone(),
                })?;
        }
        if let Some(value) = read_env("CARTWISE_FEATURES_MIN_RULE_CONFIDENCE") {
            self.features.min_rule_confidence =
                parse_f64("CARTWISE_FEATURES_MIN_RULE_CONFIDENCE", &value)?;
        }

        if let Some(value) = read_env("CARTWISE_PLATFORMS_APP") {
            self.platforms.app = parse_usize("CARTWISE_PLATFORMS_APP", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_PLATFORMS_WEB") {
            self.platforms.web = parse_usize("CARTWISE_PLATFORMS_WEB", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_PLATFORMS_KIOSK") {
            self.platforms.kiosk = parse_usize("CARTWISE_PLATFORMS_KIOSK", &value)?;
        }

        let log_level =
            read_env("CARTWISE_LOGGING_LEVEL").or_else(|| read_env("CARTWISE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CARTWISE_LOGGING_FORMAT").or_else(|| read_env("CARTWISE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(seed) = overrides.random_seed {
            self.engine.random_seed = Some(seed);
        }
        if let Some(normalization) = overrides.cooccurrence_normalization {
            self.features.cooccurrence_normalization = normalization;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_engine(&self.engine)?;
        validate_weights(&self.weights)?;
        validate_features(&self.features)?;
        validate_platforms(&self.platforms)?;
        validate_catalog(&self.catalog)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), Path::new("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Expands `${VAR}` references; an unset variable is an error.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let key = &after[..end];
        let value = env::var(key)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.to_string() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }
    output.push_str(rest);

    Ok(output)
}

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if engine.freshness_window_days < 0 {
        return Err(ConfigError::Validation(
            "engine.freshness_window_days must not be negative".to_string(),
        ));
    }
    if engine.retention_window_days < engine.freshness_window_days {
        return Err(ConfigError::Validation(
            "engine.retention_window_days must be >= engine.freshness_window_days".to_string(),
        ));
    }
    if engine.retention_window_days > MAX_WINDOW_DAYS {
        return Err(ConfigError::Validation(format!(
            "engine.retention_window_days must be <= {MAX_WINDOW_DAYS}"
        )));
    }
    for (key, fraction) in [
        ("engine.trending_fraction", engine.trending_fraction),
        ("engine.seasonal_fraction", engine.seasonal_fraction),
    ] {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ConfigError::Validation(format!("{key} must be in range 0.0..=1.0")));
        }
    }
    if engine.candidate_pool_size == 0 {
        return Err(ConfigError::Validation(
            "engine.candidate_pool_size must be greater than zero".to_string(),
        ));
    }
    if engine.baseline_top_k == 0 {
        return Err(ConfigError::Validation(
            "engine.baseline_top_k must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_weights(weights: &BlendWeights) -> Result<(), ConfigError> {
    for (key, weight) in [
        ("weights.cooccurrence", weights.cooccurrence),
        ("weights.market_basket", weights.market_basket),
        ("weights.category", weights.category),
        ("weights.popularity", weights.popularity),
    ] {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigError::Validation(format!(
                "{key} must be a finite, non-negative number"
            )));
        }
    }
    Ok(())
}

fn validate_features(features: &FeaturesConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&features.min_rule_confidence) {
        return Err(ConfigError::Validation(
            "features.min_rule_confidence must be in range 0.0..=1.0".to_string(),
        ));
    }
    if features.max_rules_per_item == 0 {
        return Err(ConfigError::Validation(
            "features.max_rules_per_item must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_platforms(platforms: &PlatformTargets) -> Result<(), ConfigError> {
    for (key, count) in [
        ("platforms.app", platforms.app),
        ("platforms.web", platforms.web),
        ("platforms.kiosk", platforms.kiosk),
    ] {
        if count == 0 {
            return Err(ConfigError::Validation(format!("{key} must be greater than zero")));
        }
    }
    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    let lists = [
        ("catalog.trending", &catalog.trending),
        ("catalog.seasonal_default", &catalog.seasonal_default),
        ("catalog.fallback", &catalog.fallback),
    ];
    for (key, items) in lists {
        let has_blank = items.as_ref().is_some_and(|items| items.iter().any(|item| item.trim().is_empty()));
        if has_blank {
            return Err(ConfigError::Validation(format!("{key} must not contain blank item names")));
        }
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.trim().parse::<i64>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    engine: Option<EnginePatch>,
    weights: Option<WeightsPatch>,
    features: Option<FeaturesPatch>,
    platforms: Option<PlatformsPatch>,
    catalog: Option<CatalogPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    freshness_window_days: Option<i64>,
    retention_window_days: Option<i64>,
    trending_fraction: Option<f64>,
    seasonal_fraction: Option<f64>,
    trending_pool_size: Option<usize>,
    candidate_pool_size: Option<usize>,
    baseline_top_k: Option<usize>,
    random_seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WeightsPatch {
    cooccurrence: Option<f64>,
    market_basket: Option<f64>,
    category: Option<f64>,
    popularity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct FeaturesPatch {
    cooccurrence_normalization: Option<CooccurrenceNormalization>,
    min_rule_confidence: Option<f64>,
    max_rules_per_item: Option<usize>,
    popularity_top_k: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct PlatformsPatch {
    app: Option<usize>,
    web: Option<usize>,
    kiosk: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    trending: Option<Vec<String>>,
    seasonal_default: Option<Vec<String>>,
    fallback: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
