use crate::card::types::{Card, CardType};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Card not found: {0}")]
    CardNotFound(String),
    #[error("Invalid catalog data: {0}")]
    InvalidCatalog(String),
}

/// Read-only lookup from card name to type and category tags
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: HashMap<String, Card>,
}

/// Category file entries: either the current list form or the legacy single string
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum CategoryEntry {
    Many(Vec<String>),
    One(String),
}

/// User changes layered over a catalog: new cards, removed cards and type overrides
#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct CatalogOverlay {
    added_cards: BTreeMap<String, serde_json::Value>,
    removed_cards: Vec<String>,
    type_overrides: BTreeMap<String, serde_json::Value>,
}

fn parse_type(value: serde_json::Value) -> Option<CardType> {
    serde_json::from_value(value).ok()
}

impl CardCatalog {
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let cards = cards
            .into_iter()
            .map(|mut card| {
                let categories = std::mem::take(&mut card.categories);
                card.set_categories(categories);
                (card.name.clone(), card)
            })
            .collect();
        CardCatalog { cards }
    }

    /// Load cards from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a JSON array of `{name, type, categories}` objects
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let cards: Vec<Card> = serde_json::from_str(content)?;
        let catalog = Self::from_cards(cards);
        catalog.validate()?;
        Ok(catalog)
    }

    /// The default card pool shipped with the tool
    pub fn builtin() -> Self {
        use CardType::*;
        let pool: [(&str, CardType); 20] = [
            ("Arianna the Labrynth Servant", Monster),
            ("Labrynth Chandraglier", Monster),
            ("Labrynth Stovie Torbie", Monster),
            ("Arias the Labrynth Butler", Monster),
            ("Absolute King Back Jack", Monster),
            ("Lady Labrynth of the Silver Castle", Monster),
            ("Lovely Labrynth of the Silver Castle", Monster),
            ("Labrynth Cooclock", Monster),
            ("Pot of Extravagance", Spell),
            ("Labrynth Labyrinth", Spell),
            ("Big Welcome Labrynth", Trap),
            ("Welcome Labrynth", Trap),
            ("Trap Trick", Trap),
            ("Destructive Daruma Karma Cannon", Trap),
            ("Dimensional Barrier", Trap),
            ("Dominus Impulse", Trap),
            ("Transaction Rollback", Trap),
            ("Ash Blossom & Joyous Spring", Monster),
            ("Called by the Grave", Spell),
            ("Infinite Impermanence", Trap),
        ];
        Self::from_cards(pool.into_iter().map(|(name, t)| Card::new(name, t)))
    }

    /// Apply a category assignment file (`{card: [tags]}`), replacing the
    /// tags of every listed card. Unknown cards are skipped with a warning.
    pub fn load_categories(&mut self, path: impl AsRef<Path>) -> Result<usize, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        self.apply_categories_json(&content)
    }

    pub fn apply_categories_json(&mut self, content: &str) -> Result<usize, CatalogError> {
        let entries: BTreeMap<String, CategoryEntry> = serde_json::from_str(content)?;
        let mut applied = 0;
        for (name, entry) in entries {
            let Some(card) = self.cards.get_mut(&name) else {
                log::warn!("ignoring categories for unknown card '{}'", name);
                continue;
            };
            let categories = match entry {
                CategoryEntry::Many(list) => list,
                CategoryEntry::One(single) => {
                    log::info!("converting legacy category format for '{}'", name);
                    vec![single]
                }
            };
            card.set_categories(categories);
            applied += 1;
        }
        Ok(applied)
    }

    /// Apply a user overlay file (`added_cards`, `removed_cards`, `type_overrides`)
    pub fn load_overrides(&mut self, path: impl AsRef<Path>) -> Result<usize, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        self.apply_overrides_json(&content)
    }

    /// Added cards join the pool, removed cards leave it, then type overrides
    /// apply to whatever remains. An added card whose type can't be read
    /// becomes a monster. Returns the resulting card count.
    pub fn apply_overrides_json(&mut self, content: &str) -> Result<usize, CatalogError> {
        let overlay: CatalogOverlay = serde_json::from_str(content)?;

        for (name, value) in overlay.added_cards {
            let card_type = parse_type(value).unwrap_or_else(|| {
                log::warn!("card '{}' has no valid type, defaulting to MONSTER", name);
                CardType::Monster
            });
            match self.cards.get_mut(&name) {
                Some(card) => card.card_type = card_type,
                None => {
                    self.cards.insert(name.clone(), Card::new(name, card_type));
                }
            }
        }

        for name in &overlay.removed_cards {
            if self.cards.remove(name).is_none() {
                log::debug!("removed card '{}' was not in the catalog", name);
            }
        }

        for (name, value) in overlay.type_overrides {
            let Some(card) = self.cards.get_mut(&name) else {
                log::warn!("ignoring type override for unknown card '{}'", name);
                continue;
            };
            match parse_type(value) {
                Some(card_type) => card.card_type = card_type,
                None => log::warn!("ignoring invalid type override for '{}'", name),
            }
        }

        self.validate()?;
        Ok(self.cards.len())
    }

    /// Get a card by name
    pub fn get_card(&self, name: &str) -> Result<&Card, CatalogError> {
        self.cards
            .get(name)
            .ok_or_else(|| CatalogError::CardNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cards.contains_key(name)
    }

    /// Type of a card, `None` when the catalog doesn't know it
    pub fn card_type(&self, name: &str) -> Option<CardType> {
        self.cards.get(name).map(|c| c.card_type)
    }

    /// Category tags of a card; unknown cards have none
    pub fn categories(&self, name: &str) -> &[String] {
        self.cards
            .get(name)
            .map(|c| c.categories.as_slice())
            .unwrap_or(&[])
    }

    /// All card names, sorted
    pub fn card_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.cards.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.cards.is_empty() {
            return Err(CatalogError::InvalidCatalog("No cards loaded".to_string()));
        }
        Ok(())
    }
}
