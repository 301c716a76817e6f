use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionAction {
    Purchase,
    Click,
    AddToCart,
    /// Any action label the tracker emits that the metrics do not count.
    #[serde(other)]
    Other,
}

/// A tracked user reaction to a shown recommendation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub action: InteractionAction,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub order_value: Option<f64>,
    #[serde(default)]
    pub item_price: Option<f64>,
}

impl InteractionEvent {
    pub fn new(action: InteractionAction, item_name: impl Into<String>) -> Self {
        Self { action, item_name: item_name.into(), order_value: None, item_price: None }
    }

    pub fn with_order_value(mut self, order_value: f64) -> Self {
        self.order_value = Some(order_value);
        self
    }

    pub fn with_item_price(mut self, item_price: f64) -> Self {
        self.item_price = Some(item_price);
        self
    }
}
