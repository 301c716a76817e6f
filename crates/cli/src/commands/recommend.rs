use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cartwise_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use cartwise_core::domain::order::{parse_item_list, Order};
use cartwise_core::recommend::{RecommendationEngine, RecommendationRequest, SeededRandom};
use cartwise_core::{CustomerType, FeatureStore, Platform, RecommendationBatch};
use serde::Deserialize;

use crate::commands::{to_data, CommandResult};

const COMMAND: &str = "recommend";

#[derive(Debug, Clone)]
pub struct RecommendArgs {
    pub orders: PathBuf,
    pub cart: Vec<String>,
    pub customer: String,
    pub platform: String,
    pub customer_type: Option<String>,
    pub store: Option<String>,
    pub count: Option<usize>,
    pub sessions: usize,
    pub seed: Option<u64>,
}

/// One row of an orders export.
#[derive(Debug, Deserialize)]
struct OrderRecord {
    #[serde(default)]
    order_id: Option<String>,
    items: ItemsField,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    customer_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemsField {
    List(Vec<Option<String>>),
    Delimited(String),
}

impl OrderRecord {
    fn into_order(self, index: usize) -> Order {
        let order_id = self.order_id.unwrap_or_else(|| format!("row-{index}"));
        let mut order = match self.items {
            ItemsField::List(items) => Order::from_raw(order_id, items),
            ItemsField::Delimited(raw) => Order::new(order_id, parse_item_list(&raw)),
        };
        if let Some(channel) = self.channel.filter(|channel| !channel.trim().is_empty()) {
            order = order.with_channel(channel.trim());
        }
        if let Some(customer_type) = self.customer_type {
            order = order.with_customer_type(CustomerType::parse_lenient(&customer_type));
        }
        order
    }
}

pub fn load_orders(path: &Path) -> Result<Vec<Order>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read orders file `{}`", path.display()))?;
    let records: Vec<OrderRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("could not parse orders file `{}`", path.display()))?;
    Ok(records.into_iter().enumerate().map(|(index, record)| record.into_order(index)).collect())
}

pub fn run(args: &RecommendArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions {
        overrides: ConfigOverrides { random_seed: args.seed, ..ConfigOverrides::default() },
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let platform = match args.platform.parse::<Platform>() {
        Ok(platform) => platform,
        Err(error) => return CommandResult::failure(COMMAND, "invalid_input", error.to_string(), 2),
    };

    let orders = match load_orders(&args.orders) {
        Ok(orders) => orders,
        Err(error) => {
            return CommandResult::failure(COMMAND, "input_file", format!("{error:#}"), 3);
        }
    };

    let features = FeatureStore::build_with_options(&orders, config.feature_options());
    let engine = match RecommendationEngine::from_settings(features, config.engine_settings()) {
        Ok(engine) => engine.with_catalog(config.promotion_catalog()),
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2);
        }
    };
    let engine = match config.engine.random_seed {
        Some(seed) => engine.with_random_source(SeededRandom::new(seed)),
        None => engine,
    };

    let mut request = RecommendationRequest::new(args.customer.clone(), platform)
        .with_current_items(args.cart.iter().cloned());
    if let Some(customer_type) = &args.customer_type {
        request = request.with_customer_type(CustomerType::parse_lenient(customer_type));
    }
    if let Some(store) = &args.store {
        request = request.with_store_id(store.clone());
    }
    if let Some(count) = args.count {
        request = request.with_target_count(count);
    }

    let mut batches: Vec<RecommendationBatch> = Vec::with_capacity(args.sessions);
    for _ in 0..args.sessions.max(1) {
        match engine.recommend(&request) {
            Ok(batch) => batches.push(batch),
            Err(error) => {
                return CommandResult::failure(
                    COMMAND,
                    error.error_class(),
                    format!("{}: {error}", error.user_message()),
                    4,
                );
            }
        }
    }

    match to_data(COMMAND, &batches) {
        Ok(data) => CommandResult::success_with_data(
            COMMAND,
            format!(
                "generated {} session(s) from {} order(s) for customer `{}`",
                batches.len(),
                orders.len(),
                args.customer
            ),
            data,
        ),
        Err(failure) => failure,
    }
}
