use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use cartwise_cli::commands::recommend::{load_orders, RecommendArgs};
use cartwise_cli::commands::{config, metrics, recommend, variant};
use serde_json::Value;
use tempfile::TempDir;

const ORDERS_JSON: &str = r#"[
  {"order_id": "1", "items": ["Traditional Wings", "Ranch Dip"], "channel": "Digital"},
  {"order_id": "2", "items": "Traditional Wings, Fries", "customer_type": "registered"},
  {"items": ["Fries", "Soda", "nan", null]}
]"#;

#[test]
fn recommend_returns_sessions_without_repeating_items() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let orders = write_file(dir.path(), "orders.json", ORDERS_JSON);

        let result = recommend::run(&args(orders, "web", 2));
        assert_eq!(result.exit_code, 0, "expected successful recommend run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "recommend");
        assert_eq!(payload["status"], "ok");

        let sessions = payload["data"].as_array().expect("sessions array");
        assert_eq!(sessions.len(), 2);
        let first = item_names(&sessions[0]);
        let second = item_names(&sessions[1]);
        assert!(!first.is_empty() && first.len() <= 5);
        assert!(!first.contains("Traditional Wings"));
        assert!(first.is_disjoint(&second), "second session repeated {first:?} / {second:?}");
        assert_eq!(sessions[0]["customer_id"], "c-1");
    });
}

#[test]
fn recommend_honours_platform_targets_from_env() {
    with_env(&[("CARTWISE_PLATFORMS_KIOSK", "2")], || {
        let dir = TempDir::new().expect("temp dir");
        let orders = write_file(dir.path(), "orders.json", ORDERS_JSON);

        let result = recommend::run(&args(orders, "kiosk", 1));
        assert_eq!(result.exit_code, 0, "expected successful recommend run: {}", result.output);

        let payload = parse_payload(&result.output);
        let recommendations = payload["data"][0]["recommendations"].as_array().expect("list");
        assert_eq!(recommendations.len(), 2);
        assert_eq!(recommendations[0]["rank"], 1);
        assert_eq!(recommendations[0]["platform"], "kiosk");
    });
}

#[test]
fn recommend_rejects_unknown_platform() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let orders = write_file(dir.path(), "orders.json", ORDERS_JSON);

        let result = recommend::run(&args(orders, "fax", 1));
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
    });
}

#[test]
fn recommend_reports_missing_orders_file() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");

        let result = recommend::run(&args(dir.path().join("absent.json"), "app", 1));
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "input_file");
        assert!(payload["message"].as_str().unwrap_or("").contains("absent.json"));
    });
}

#[test]
fn orders_file_accepts_lists_and_delimited_strings() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(dir.path(), "orders.json", ORDERS_JSON);

    let orders = load_orders(&path).expect("orders load");

    assert_eq!(orders.len(), 3);
    assert_eq!(orders[1].items, vec!["Traditional Wings".to_string(), "Fries".to_string()]);
    assert_eq!(orders[2].items, vec!["Fries".to_string(), "Soda".to_string()]);
    assert_eq!(orders[2].order_id, "row-2");
    assert_eq!(orders[0].channel.as_deref(), Some("Digital"));
}

#[test]
fn metrics_reports_adoption_rate() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let recommendations: Vec<Value> = (0..10)
            .map(|index| serde_json::json!({"item_name": format!("Item {index}")}))
            .collect();
        let input = serde_json::json!({
            "recommendations": recommendations,
            "interactions": [
                {"action": "purchase", "item_name": "X"},
                {"action": "purchase", "item_name": "X"},
                {"action": "purchase", "item_name": "X"}
            ]
        });
        let path = write_file(dir.path(), "outcomes.json", &input.to_string());

        let result = metrics::run(&path);
        assert_eq!(result.exit_code, 0, "expected successful metrics run: {}", result.output);

        let payload = parse_payload(&result.output);
        let adoption = payload["data"]["recommendation_adoption_rate"].as_f64().unwrap_or(-1.0);
        assert!((adoption - 0.3).abs() < 1e-9);
        assert_eq!(payload["data"]["click_through_rate"].as_f64(), Some(0.0));
    });
}

#[test]
fn metrics_with_empty_input_reports_zeros() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(dir.path(), "outcomes.json", "{}");

        let result = metrics::run(&path);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let data = payload["data"].as_object().expect("metrics object");
        assert_eq!(data.len(), 9);
        assert!(data.values().all(|value| value.as_f64() == Some(0.0)));
    });
}

#[test]
fn variant_assignment_is_stable() {
    let first = parse_payload(&variant::run("c-1", Some(1.0), Some("pilot")).output);
    let second = parse_payload(&variant::run("c-1", Some(1.0), Some("pilot")).output);

    assert_eq!(first["status"], "ok");
    assert_eq!(first["data"]["variant"], second["data"]["variant"]);
    let variant = first["data"]["variant"].as_str().unwrap_or("");
    assert!(["control", "enhanced_personalization", "freshness_boost"].contains(&variant));
}

#[test]
fn variant_rejects_out_of_range_percentage() {
    let result = variant::run("c-1", Some(1.5), None);
    assert_eq!(result.exit_code, 2);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["error_class"], "invalid_input");
}

#[test]
fn config_output_attributes_env_values() {
    let vars = [("CARTWISE_WEIGHTS_CATEGORY", "0.25"), ("CARTWISE_ENGINE_BASELINE_TOP_K", "4")];
    with_env(&vars, || {
        let output = config::run();

        assert!(output.starts_with("effective config"));
        assert!(output.contains("- weights.category = 0.25 (source: env (CARTWISE_WEIGHTS_CATEGORY))"));
        assert!(output.contains("- platforms.web = 5 (source: default)"));
        assert!(output.contains("- engine.random_seed = <entropy> (source: default)"));
        assert!(output.contains(
            "- engine.baseline_top_k = 4 (source: env (CARTWISE_ENGINE_BASELINE_TOP_K))"
        ));
    });
}

#[test]
fn config_output_reports_validation_failure() {
    with_env(&[("CARTWISE_ENGINE_TRENDING_FRACTION", "1.5")], || {
        let output = config::run();
        assert!(output.starts_with("config validation failed"));
        assert!(output.contains("engine.trending_fraction"));
    });
}

fn args(orders: PathBuf, platform: &str, sessions: usize) -> RecommendArgs {
    RecommendArgs {
        orders,
        cart: vec!["Traditional Wings".to_string()],
        customer: "c-1".to_string(),
        platform: platform.to_string(),
        customer_type: Some("registered".to_string()),
        store: Some("2156".to_string()),
        count: None,
        sessions,
        seed: Some(7),
    }
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("fixture write");
    path
}

fn item_names(batch: &Value) -> HashSet<String> {
    batch["recommendations"]
        .as_array()
        .map(|recommendations| {
            recommendations
                .iter()
                .filter_map(|rec| rec["item_name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CARTWISE_ENGINE_FRESHNESS_WINDOW_DAYS",
        "CARTWISE_ENGINE_RETENTION_WINDOW_DAYS",
        "CARTWISE_ENGINE_TRENDING_FRACTION",
        "CARTWISE_ENGINE_SEASONAL_FRACTION",
        "CARTWISE_ENGINE_TRENDING_POOL_SIZE",
        "CARTWISE_ENGINE_CANDIDATE_POOL_SIZE",
        "CARTWISE_ENGINE_BASELINE_TOP_K",
        "CARTWISE_ENGINE_RANDOM_SEED",
        "CARTWISE_WEIGHTS_COOCCURRENCE",
        "CARTWISE_WEIGHTS_MARKET_BASKET",
        "CARTWISE_WEIGHTS_CATEGORY",
        "CARTWISE_WEIGHTS_POPULARITY",
        "CARTWISE_FEATURES_COOCCURRENCE_NORMALIZATION",
        "CARTWISE_FEATURES_MIN_RULE_CONFIDENCE",
        "CARTWISE_PLATFORMS_APP",
        "CARTWISE_PLATFORMS_WEB",
        "CARTWISE_PLATFORMS_KIOSK",
        "CARTWISE_LOGGING_LEVEL",
        "CARTWISE_LOGGING_FORMAT",
        "CARTWISE_LOG_LEVEL",
        "CARTWISE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
