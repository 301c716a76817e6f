use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use cartwise_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};
use toml::Value;

/// (key path, environment variable) pairs shown by the config command.
const REPORTED_KEYS: &[(&str, Option<&str>)] = &[
    ("engine.freshness_window_days", Some("CARTWISE_ENGINE_FRESHNESS_WINDOW_DAYS")),
    ("engine.retention_window_days", Some("CARTWISE_ENGINE_RETENTION_WINDOW_DAYS")),
    ("engine.trending_fraction", Some("CARTWISE_ENGINE_TRENDING_FRACTION")),
    ("engine.seasonal_fraction", Some("CARTWISE_ENGINE_SEASONAL_FRACTION")),
    ("engine.trending_pool_size", Some("CARTWISE_ENGINE_TRENDING_POOL_SIZE")),
    ("engine.candidate_pool_size", Some("CARTWISE_ENGINE_CANDIDATE_POOL_SIZE")),
    ("engine.baseline_top_k", Some("CARTWISE_ENGINE_BASELINE_TOP_K")),
    ("engine.random_seed", Some("CARTWISE_ENGINE_RANDOM_SEED")),
    ("weights.cooccurrence", Some("CARTWISE_WEIGHTS_COOCCURRENCE")),
    ("weights.market_basket", Some("CARTWISE_WEIGHTS_MARKET_BASKET")),
    ("weights.category", Some("CARTWISE_WEIGHTS_CATEGORY")),
    ("weights.popularity", Some("CARTWISE_WEIGHTS_POPULARITY")),
    ("features.cooccurrence_normalization", Some("CARTWISE_FEATURES_COOCCURRENCE_NORMALIZATION")),
    ("features.min_rule_confidence", Some("CARTWISE_FEATURES_MIN_RULE_CONFIDENCE")),
    ("features.max_rules_per_item", None),
    ("features.popularity_top_k", None),
    ("platforms.app", Some("CARTWISE_PLATFORMS_APP")),
    ("platforms.web", Some("CARTWISE_PLATFORMS_WEB")),
    ("platforms.kiosk", Some("CARTWISE_PLATFORMS_KIOSK")),
    ("logging.level", Some("CARTWISE_LOGGING_LEVEL")),
    ("logging.format", Some("CARTWISE_LOGGING_FORMAT")),
];

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_key) in REPORTED_KEYS {
        let source =
            field_source(key_path, *env_key, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &effective_value(&config, key_path), source));
    }

    for (key_path, items) in [
        ("catalog.trending", &config.catalog.trending),
        ("catalog.seasonal_default", &config.catalog.seasonal_default),
        ("catalog.fallback", &config.catalog.fallback),
    ] {
        let value = items.as_ref().map(|items| items.join(", ")).unwrap_or_else(|| "<built-in>".to_string());
        let source = field_source(key_path, None, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn effective_value(config: &AppConfig, key_path: &str) -> String {
    match key_path {
        "engine.freshness_window_days" => config.engine.freshness_window_days.to_string(),
        "engine.retention_window_days" => config.engine.retention_window_days.to_string(),
        "engine.trending_fraction" => config.engine.trending_fraction.to_string(),
        "engine.seasonal_fraction" => config.engine.seasonal_fraction.to_string(),
        "engine.trending_pool_size" => config.engine.trending_pool_size.to_string(),
        "engine.candidate_pool_size" => config.engine.candidate_pool_size.to_string(),
        "engine.baseline_top_k" => config.engine.baseline_top_k.to_string(),
        "engine.random_seed" => config
            .engine
            .random_seed
            .map(|seed| seed.to_string())
            .unwrap_or_else(|| "<entropy>".to_string()),
        "weights.cooccurrence" => config.weights.cooccurrence.to_string(),
        "weights.market_basket" => config.weights.market_basket.to_string(),
        "weights.category" => config.weights.category.to_string(),
        "weights.popularity" => config.weights.popularity.to_string(),
        "features.cooccurrence_normalization" => {
            format!("{:?}", config.features.cooccurrence_normalization)
        }
        "features.min_rule_confidence" => config.features.min_rule_confidence.to_string(),
        "features.max_rules_per_item" => config.features.max_rules_per_item.to_string(),
        "features.popularity_top_k" => config.features.popularity_top_k.to_string(),
        "platforms.app" => config.platforms.app.to_string(),
        "platforms.web" => config.platforms.web.to_string(),
        "platforms.kiosk" => config.platforms.kiosk.to_string(),
        "logging.level" => config.logging.level.clone(),
        "logging.format" => config.logging.format.as_str().to_string(),
        _ => "<unknown>".to_string(),
    }
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from(DEFAULT_CONFIG_FILE);
    if root.exists() {
        return Some(root);
    }

    let nested = Path::new("config").join(DEFAULT_CONFIG_FILE);
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
