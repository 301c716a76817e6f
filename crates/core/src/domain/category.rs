use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Menu taxonomy used for diversity and complementarity decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Wings,
    Chicken,
    Fries,
    Sides,
    DipsSauces,
    Drinks,
    Combos,
    Subs,
    Desserts,
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Wings,
        Category::Chicken,
        Category::Fries,
        Category::Sides,
        Category::DipsSauces,
        Category::Drinks,
        Category::Combos,
        Category::Subs,
        Category::Desserts,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wings => "wings",
            Self::Chicken => "chicken",
            Self::Fries => "fries",
            Self::Sides => "sides",
            Self::DipsSauces => "dips_sauces",
            Self::Drinks => "drinks",
            Self::Combos => "combos",
            Self::Subs => "subs",
            Self::Desserts => "desserts",
            Self::Other => "other",
        }
    }

    /// Categories that tend to be ordered alongside this one.
    ///
    /// Only wings, drinks, sides and desserts carry pairings; every other
    /// category contributes nothing and the caller falls back to
    /// [`DEFAULT_COMPLEMENTS`].
    pub fn complements(&self) -> &'static [Category] {
        match self {
            Self::Wings => &[Category::Drinks, Category::Sides],
            Self::Drinks => &[Category::Wings, Category::Sides, Category::Desserts],
            Self::Sides => &[Category::Wings, Category::Drinks],
            Self::Desserts => &[Category::Drinks],
            _ => &[],
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown menu category `{value}`")))
    }
}

/// Complementary set used when the cart touches no paired category.
pub const DEFAULT_COMPLEMENTS: [Category; 3] = [Category::Wings, Category::Sides, Category::Drinks];

/// Bumped whenever [`CATEGORY_KEYWORDS`] changes order or content.
pub const TAXONOMY_VERSION: u32 = 2;

/// Keyword groups in priority order: the first group with a keyword contained
/// in the lowercased item name wins. Wings is checked before chicken, so
/// "Buffalo Chicken Sandwich" lands in wings.
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Wings, &["wing", "buffalo", "grilled", "spicy", "mild", "honey", "bbq", "hot"]),
    (Category::Chicken, &["chicken", "strips", "tender", "crispy", "fried"]),
    (Category::Fries, &["fries", "buffalo fries"]),
    (Category::Sides, &["corn", "onion", "rings", "salad", "coleslaw", "bread"]),
    (Category::DipsSauces, &["dip", "sauce", "ranch", "blue cheese", "honey mustard"]),
    (Category::Drinks, &["drink", "soda", "cola", "sprite", "juice", "water", "oz"]),
    (Category::Combos, &["combo"]),
    (Category::Subs, &["sub", "sandwich"]),
    (Category::Desserts, &["ice cream", "cake", "cookie", "brownie", "pie", "dessert", "shake"]),
];

pub fn categorize(item_name: &str) -> Category {
    let lowered = item_name.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Union of the complements of every category present, or the default set
/// when none of them has a pairing.
pub fn complementary_categories<I>(present: I) -> Vec<Category>
where
    I: IntoIterator<Item = Category>,
{
    let mut complements: Vec<Category> =
        present.into_iter().flat_map(|category| category.complements().iter().copied()).collect();
    complements.sort();
    complements.dedup();

    if complements.is_empty() {
        DEFAULT_COMPLEMENTS.to_vec()
    } else {
        complements
    }
}

#[cfg(test)]
mod tests {
    use super::{categorize, complementary_categories, Category};

    #[test]
    fn wings_keywords_win_over_chicken() {
        assert_eq!(categorize("Buffalo Chicken Sandwich"), Category::Wings);
        assert_eq!(categorize("Chicken Strips"), Category::Chicken);
    }

    #[test]
    fn categorization_follows_priority_order() {
        assert_eq!(categorize("Traditional Wings"), Category::Wings);
        assert_eq!(categorize("Fries"), Category::Fries);
        assert_eq!(categorize("Ranch Dip"), Category::DipsSauces);
        assert_eq!(categorize("Soda"), Category::Drinks);
        assert_eq!(categorize("20 oz Lemonade"), Category::Drinks);
        assert_eq!(categorize("Family Combo"), Category::Combos);
        assert_eq!(categorize("Philly Sub"), Category::Subs);
        assert_eq!(categorize("Chocolate Brownie"), Category::Desserts);
    }

    #[test]
    fn unmatched_items_fall_to_other() {
        assert_eq!(categorize("Gift Card"), Category::Other);
        assert_eq!(categorize(""), Category::Other);
    }

    #[test]
    fn complements_are_unioned_and_deduplicated() {
        let complements = complementary_categories([Category::Wings, Category::Sides]);
        assert_eq!(complements, vec![Category::Wings, Category::Sides, Category::Drinks]);
    }

    #[test]
    fn unpaired_categories_use_default_complements() {
        let complements = complementary_categories([Category::Fries, Category::Other]);
        assert_eq!(complements, vec![Category::Wings, Category::Sides, Category::Drinks]);

        let empty = complementary_categories(std::iter::empty());
        assert_eq!(empty.len(), 3);
    }

    #[test]
    fn category_round_trips_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("pizza".parse::<Category>().is_err());
    }
}
