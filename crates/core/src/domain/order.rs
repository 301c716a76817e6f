use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::channel::CustomerType;

/// Placeholder strings that upstream exports use for missing cells.
const SENTINEL_VALUES: [&str; 4] = ["nan", "null", "none", "n/a"];

/// One historical order. Only aggregate statistics are derived from it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub items: Vec<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub customer_type: Option<CustomerType>,
    #[serde(default)]
    pub placed_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new<I, S>(order_id: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order_id: order_id.into(),
            items: items.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Builds an order from raw export cells, dropping blank and sentinel values.
    pub fn from_raw<I, S>(order_id: impl Into<String>, raw_items: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let items = raw_items
            .into_iter()
            .flatten()
            .filter_map(|raw| normalize_item_name(raw.as_ref()))
            .collect();

        Self { order_id: order_id.into(), items, ..Self::default() }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_customer_type(mut self, customer_type: CustomerType) -> Self {
        self.customer_type = Some(customer_type);
        self
    }

    pub fn with_placed_at(mut self, placed_at: DateTime<Utc>) -> Self {
        self.placed_at = Some(placed_at);
        self
    }

    /// Distinct item names in first-seen order.
    pub fn unique_items(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.items.iter().map(String::as_str).filter(|item| seen.insert(*item)).collect()
    }
}

pub fn normalize_item_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_ascii_lowercase();
    if SENTINEL_VALUES.contains(&lowered.as_str()) {
        return None;
    }
    Some(trimmed.to_string())
}

/// Splits a delimited items cell (comma, pipe or semicolon) into clean names.
pub fn parse_item_list(raw: &str) -> Vec<String> {
    raw.split([',', '|', ';']).filter_map(normalize_item_name).collect()
}
