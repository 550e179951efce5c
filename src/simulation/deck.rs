use crate::card::{CardCatalog, CardType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub const MIN_DECK_SIZE: usize = 40;
pub const MAX_DECK_SIZE: usize = 60;
pub const MAX_CARD_COPIES: usize = 3;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid deck format at line {line}: {reason}")]
    InvalidFormat { line: usize, reason: String },
    #[error("Invalid copy count for '{card}': {count} (allowed 1-3)")]
    InvalidCopies { card: String, count: usize },
    #[error("Deck has {total} cards, allowed 40-60")]
    InvalidSize { total: usize },
}

/// Card name to copy count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck {
    cards: BTreeMap<String, usize>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a deck without checking deckbuilding limits; zero counts are dropped
    pub fn from_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut deck = Deck::new();
        for (name, count) in counts {
            deck.add(name, count);
        }
        deck
    }

    pub fn add(&mut self, name: impl Into<String>, count: usize) {
        if count == 0 {
            return;
        }
        *self.cards.entry(name.into()).or_insert(0) += count;
    }

    pub fn copies(&self, name: &str) -> usize {
        self.cards.get(name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.cards.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.cards.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cards.keys().map(|s| s.as_str())
    }

    /// One entry per physical copy
    pub fn expand(&self) -> Vec<&str> {
        let mut population = Vec::with_capacity(self.total());
        for (name, count) in self.iter() {
            population.extend(std::iter::repeat(name).take(count));
        }
        population
    }

    /// Checks applied when a deck is loaded: per-card copy limit and maximum size
    pub fn check_limits(&self) -> Result<(), DeckError> {
        for (name, count) in self.iter() {
            if count > MAX_CARD_COPIES {
                return Err(DeckError::InvalidCopies {
                    card: name.to_string(),
                    count,
                });
            }
        }
        let total = self.total();
        if total > MAX_DECK_SIZE {
            return Err(DeckError::InvalidSize { total });
        }
        Ok(())
    }

    /// Full deckbuilding check, including the minimum size
    pub fn validate(&self) -> Result<(), DeckError> {
        self.check_limits()?;
        let total = self.total();
        if total < MIN_DECK_SIZE {
            return Err(DeckError::InvalidSize { total });
        }
        Ok(())
    }

    /// Drop cards the catalog doesn't know, returning their names
    pub fn retain_known(&mut self, catalog: &CardCatalog) -> Vec<String> {
        let unknown: Vec<String> = self
            .names()
            .filter(|name| !catalog.contains(name))
            .map(str::to_string)
            .collect();
        for name in &unknown {
            log::warn!("card '{}' is not in the catalog and was removed from the deck", name);
            self.cards.remove(name);
        }
        unknown
    }

    /// Per-card copy differences against `other`, sorted by card name.
    /// Cards with equal counts are left out.
    pub fn differences(&self, other: &Deck) -> Vec<DeckDifference> {
        let names: BTreeSet<&str> = self.names().chain(other.names()).collect();
        names
            .into_iter()
            .filter_map(|name| {
                let (ours, theirs) = (self.copies(name), other.copies(name));
                (ours != theirs).then(|| DeckDifference {
                    card: name.to_string(),
                    copies_a: ours,
                    copies_b: theirs,
                })
            })
            .collect()
    }

    /// Type breakdown used by the composition-ratio insights
    pub fn stats(&self, catalog: &CardCatalog) -> DeckStats {
        let mut stats = DeckStats {
            total: self.total(),
            ..DeckStats::default()
        };
        for (name, count) in self.iter() {
            match catalog.card_type(name) {
                Some(CardType::Monster) => stats.monsters += count,
                Some(CardType::Spell) => stats.spells += count,
                Some(CardType::Trap) => stats.traps += count,
                None => {}
            }
        }
        stats
    }
}

/// One card whose copy count differs between Deck A and Deck B
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckDifference {
    pub card: String,
    pub copies_a: usize,
    pub copies_b: usize,
}

impl fmt::Display for DeckDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.copies_b > self.copies_a {
            write!(f, "+{} {} (B has more)", self.copies_b - self.copies_a, self.card)
        } else {
            write!(f, "-{} {} (A has more)", self.copies_a - self.copies_b, self.card)
        }
    }
}

/// Total card count and per-type counts of a deck
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckStats {
    pub total: usize,
    #[serde(rename = "M")]
    pub monsters: usize,
    #[serde(rename = "S")]
    pub spells: usize,
    #[serde(rename = "T")]
    pub traps: usize,
}

impl DeckStats {
    /// Share of `count` in the deck, 0 for an empty deck
    pub fn ratio(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }
}

/// Parse the text deck format: "3 Card Name" per line, comments with # or //
pub fn parse_deck_str(content: &str) -> Result<Deck, DeckError> {
    let mut deck = Deck::new();

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        // Skip empty lines and comments
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
            continue;
        }

        let Some((count_str, card_name)) = trimmed.split_once(' ') else {
            return Err(DeckError::InvalidFormat {
                line: line_num + 1,
                reason: "Expected format: 'COUNT CARD_NAME'".to_string(),
            });
        };

        let count: usize = count_str.parse().map_err(|_| DeckError::InvalidFormat {
            line: line_num + 1,
            reason: format!("'{}' is not a valid number", count_str),
        })?;
        if count == 0 {
            return Err(DeckError::InvalidCopies {
                card: card_name.trim().to_string(),
                count,
            });
        }

        deck.add(card_name.trim(), count);
    }

    Ok(deck)
}

/// Parse the JSON deck format: `{"Card Name": 3, ...}`
pub fn parse_deck_json(content: &str) -> Result<Deck, DeckError> {
    let counts: BTreeMap<String, usize> = serde_json::from_str(content)?;
    if let Some((card, _)) = counts.iter().find(|(_, count)| **count == 0) {
        return Err(DeckError::InvalidCopies {
            card: card.clone(),
            count: 0,
        });
    }
    Ok(Deck::from_counts(counts))
}

/// Load a deck file (`.json` or text), apply load-time limits and drop
/// cards unknown to the catalog
pub fn parse_deck_file(path: impl AsRef<Path>, catalog: &CardCatalog) -> Result<Deck, DeckError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let mut deck = if is_json {
        parse_deck_json(&content)?
    } else {
        parse_deck_str(&content)?
    };
    deck.check_limits()?;
    deck.retain_known(catalog);
    Ok(deck)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Labrynth core
3 Arias the Labrynth Butler
// traps
3 Welcome Labrynth
2 Trap Trick
1 Arias the Labrynth Butler
";

    #[test]
    fn test_differences_sorted_by_name() {
        let a = Deck::from_counts([("Welcome Labrynth", 3), ("Trap Trick", 2), ("Dominus Impulse", 1)]);
        let b = Deck::from_counts([("Welcome Labrynth", 3), ("Trap Trick", 3), ("Ash Blossom & Joyous Spring", 2)]);
        let lines: Vec<String> = a.differences(&b).iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "+2 Ash Blossom & Joyous Spring (B has more)",
                "-1 Dominus Impulse (A has more)",
                "+1 Trap Trick (B has more)",
            ]
        );
        assert!(a.differences(&a.clone()).is_empty());
    }

    #[test]
    fn test_parse_deck_str() {
        let deck = parse_deck_str(SAMPLE).expect("sample should parse");
        assert_eq!(deck.copies("Arias the Labrynth Butler"), 4);
        assert_eq!(deck.copies("Trap Trick"), 2);
        assert_eq!(deck.total(), 9);
    }

    #[test]
    fn test_invalid_line() {
        let err = parse_deck_str("3 Trap Trick\nTrapTrick\n").unwrap_err();
        assert!(matches!(err, DeckError::InvalidFormat { line: 2, .. }));
        let err = parse_deck_str("x Trap Trick").unwrap_err();
        assert!(matches!(err, DeckError::InvalidFormat { line: 1, .. }));
    }

    #[test]
    fn test_limits() {
        let deck = parse_deck_str(SAMPLE).expect("sample should parse");
        assert!(matches!(
            deck.check_limits(),
            Err(DeckError::InvalidCopies { count: 4, .. })
        ));

        let small = Deck::from_counts([("A", 3), ("B", 2)]);
        assert!(small.check_limits().is_ok());
        assert!(matches!(small.validate(), Err(DeckError::InvalidSize { total: 5 })));

        let big = Deck::from_counts((0..21).map(|i| (format!("card {}", i), 3)));
        assert!(matches!(big.check_limits(), Err(DeckError::InvalidSize { total: 63 })));

        let legal = Deck::from_counts((0..20).map(|i| (format!("card {}", i), 2)));
        assert!(legal.validate().is_ok());
    }

    #[test]
    fn test_expand_one_entry_per_copy() {
        let deck = Deck::from_counts([("X", 3), ("Y", 1), ("Z", 0)]);
        let population = deck.expand();
        assert_eq!(population.len(), 4);
        assert_eq!(population.iter().filter(|c| **c == "X").count(), 3);
        assert!(!population.contains(&"Z"));
    }

    #[test]
    fn test_json_deck_and_zero_counts() {
        let deck = parse_deck_json(r#"{"Trap Trick": 3, "Dominus Impulse": 2}"#).expect("valid deck");
        assert_eq!(deck.total(), 5);
        assert!(matches!(
            parse_deck_json(r#"{"Trap Trick": 0}"#),
            Err(DeckError::InvalidCopies { count: 0, .. })
        ));
    }

    #[test]
    fn test_stats_and_ratio() {
        let catalog = CardCatalog::builtin();
        let deck = Deck::from_counts([
            ("Arias the Labrynth Butler", 3),
            ("Pot of Extravagance", 2),
            ("Welcome Labrynth", 3),
            ("Mystery Card", 2),
        ]);
        let stats = deck.stats(&catalog);
        assert_eq!(stats, DeckStats { total: 10, monsters: 3, spells: 2, traps: 3 });
        assert!((stats.ratio(stats.monsters) - 30.0).abs() < 1e-9);
        assert_eq!(DeckStats::default().ratio(0), 0.0);
    }

    #[test]
    fn test_parse_deck_file_drops_unknown_cards() {
        let catalog = CardCatalog::builtin();
        let path = std::env::temp_dir().join(format!("deck_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"Trap Trick": 3, "Homebrew Card": 1}"#)
            .expect("temp file should be writable");
        let deck = parse_deck_file(&path, &catalog).expect("deck should load");
        std::fs::remove_file(&path).ok();

        assert_eq!(deck.copies("Trap Trick"), 3);
        assert_eq!(deck.copies("Homebrew Card"), 0);
    }
}
