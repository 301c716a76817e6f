use serde::{Deserialize, Serialize};

use crate::domain::category::Category;

/// Menu item as seen by the engine: a name plus derived attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub category: Category,
    /// Share of all observed item occurrences, 0 for items never ordered.
    pub frequency: f64,
    pub is_trending: bool,
    pub is_seasonal: bool,
}

impl MenuItem {
    pub fn is_combo(&self) -> bool {
        self.name.to_lowercase().contains("combo")
    }

    pub fn is_wings(&self) -> bool {
        self.name.to_lowercase().contains("wing")
    }
}
