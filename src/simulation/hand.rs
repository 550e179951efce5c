use crate::card::CardCatalog;
use crate::combo::{ComboError, ComboRuleSet, HandSet};
use crate::simulation::results::{CategoryComposition, TypeComposition};
use std::collections::{BTreeMap, BTreeSet};

pub const HAND_SIZE: usize = 5;

/// Everything one drawn hand contributes to a run's counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandTally<'a> {
    /// Distinct card names
    pub cards: BTreeSet<&'a str>,
    /// Combos the hand satisfies
    pub combos: Vec<&'a str>,
    /// Names held two or more times
    pub duplicates: Vec<&'a str>,
    pub composition: TypeComposition,
    /// Cards the catalog doesn't know
    pub unknown: usize,
    /// One entry per tag per physical card
    pub categories: Vec<&'a str>,
    pub category_key: CategoryComposition,
}

impl<'a> HandTally<'a> {
    /// Evaluate a hand. Fails only when a combo rule fails to evaluate.
    pub fn from_hand(
        hand: &[&'a str],
        rules: &'a ComboRuleSet,
        catalog: &'a CardCatalog,
    ) -> Result<Self, ComboError> {
        let mut copies: BTreeMap<&'a str, usize> = BTreeMap::new();
        for &card in hand {
            *copies.entry(card).or_insert(0) += 1;
        }
        let cards: BTreeSet<&'a str> = copies.keys().copied().collect();

        let hand_set: HandSet = cards.iter().copied().collect();
        let combos = rules.satisfied(&hand_set)?;

        let duplicates = copies
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(card, _)| *card)
            .collect();

        let mut composition = TypeComposition::default();
        let mut unknown = 0;
        for &card in hand {
            match catalog.card_type(card) {
                Some(card_type) => composition.add(card_type),
                None => unknown += 1,
            }
        }

        let mut categories = Vec::new();
        let mut per_category: BTreeMap<&'a str, usize> = BTreeMap::new();
        let mut uncategorized = 0;
        for &card in hand {
            let tags = catalog.categories(card);
            if tags.is_empty() {
                uncategorized += 1;
                continue;
            }
            for tag in tags {
                categories.push(tag.as_str());
                *per_category.entry(tag.as_str()).or_insert(0) += 1;
            }
        }

        Ok(HandTally {
            cards,
            combos,
            duplicates,
            composition,
            unknown,
            categories,
            category_key: category_key(&per_category, uncategorized),
        })
    }
}

fn category_key(per_category: &BTreeMap<&str, usize>, uncategorized: usize) -> CategoryComposition {
    if per_category.is_empty() {
        return CategoryComposition::Uncategorized;
    }
    let mut parts: Vec<String> = per_category
        .iter()
        .map(|(category, count)| format!("{}:{}", category, count))
        .collect();
    if uncategorized > 0 {
        parts.push(format!("Uncategorized:{}", uncategorized));
    }
    CategoryComposition::Breakdown(parts.join(", "))
}
