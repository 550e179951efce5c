use serde::{Deserialize, Serialize};
use std::fmt;

/// Card types in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardType {
    Monster,
    Spell,
    Trap,
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardType::Monster => write!(f, "MONSTER"),
            CardType::Spell => write!(f, "SPELL"),
            CardType::Trap => write!(f, "TRAP"),
        }
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    /// Sorted, deduplicated category tags
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Card {
    pub fn new(name: impl Into<String>, card_type: CardType) -> Self {
        Card {
            name: name.into(),
            card_type,
            categories: Vec::new(),
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_categories(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_categories(&mut self, mut categories: Vec<String>) {
        categories.retain(|c| !c.trim().is_empty());
        categories.sort();
        categories.dedup();
        self.categories = categories;
    }
}
