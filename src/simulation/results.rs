use crate::card::CardType;
use crate::simulation::hand::HandTally;
use std::collections::BTreeMap;
use std::fmt;

/// Monster / Spell / Trap counts of one hand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeComposition {
    pub monsters: usize,
    pub spells: usize,
    pub traps: usize,
}

impl TypeComposition {
    pub fn add(&mut self, card_type: CardType) {
        match card_type {
            CardType::Monster => self.monsters += 1,
            CardType::Spell => self.spells += 1,
            CardType::Trap => self.traps += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.monsters + self.spells + self.traps
    }
}

impl fmt::Display for TypeComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M:{} S:{} T:{}", self.monsters, self.spells, self.traps)
    }
}

/// Per-hand category breakdown key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryComposition {
    /// Sorted "Category:Count" parts, with a trailing "Uncategorized:n" if any
    Breakdown(String),
    /// No card in the hand carries a category
    Uncategorized,
}

impl fmt::Display for CategoryComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryComposition::Breakdown(key) => f.write_str(key),
            CategoryComposition::Uncategorized => f.write_str("Uncategorized Hand"),
        }
    }
}

/// `count` as a percentage of `total`, 0 when nothing was counted
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

fn bump(counter: &mut BTreeMap<String, usize>, key: &str) {
    match counter.get_mut(key) {
        Some(count) => *count += 1,
        None => {
            counter.insert(key.to_string(), 1);
        }
    }
}

/// Counters accumulated over every accepted hand of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    /// Trials the run was asked for
    pub requested: usize,
    /// Trials that were drawn and counted
    pub sim_count: usize,
    /// Set when the run stopped early on request
    pub cancelled: bool,
    pub card_counts: BTreeMap<String, usize>,
    pub combo_counts: BTreeMap<String, usize>,
    pub duplicate_counts: BTreeMap<String, usize>,
    pub composition_counts: BTreeMap<TypeComposition, usize>,
    pub category_counts: BTreeMap<String, usize>,
    pub category_composition_counts: BTreeMap<CategoryComposition, usize>,
}

impl RunResult {
    pub fn new(requested: usize) -> Self {
        RunResult {
            requested,
            ..Self::default()
        }
    }

    /// Fold one hand into the counters
    pub fn record(&mut self, tally: &HandTally) {
        for card in &tally.cards {
            bump(&mut self.card_counts, card);
        }
        for combo in &tally.combos {
            bump(&mut self.combo_counts, combo);
        }
        for card in &tally.duplicates {
            bump(&mut self.duplicate_counts, card);
        }
        *self.composition_counts.entry(tally.composition).or_insert(0) += 1;
        for category in &tally.categories {
            bump(&mut self.category_counts, category);
        }
        *self
            .category_composition_counts
            .entry(tally.category_key.clone())
            .or_insert(0) += 1;
        self.sim_count += 1;
    }

    pub fn card_count(&self, name: &str) -> usize {
        self.card_counts.get(name).copied().unwrap_or(0)
    }

    pub fn combo_count(&self, name: &str) -> usize {
        self.combo_counts.get(name).copied().unwrap_or(0)
    }

    pub fn duplicate_count(&self, name: &str) -> usize {
        self.duplicate_counts.get(name).copied().unwrap_or(0)
    }

    pub fn category_count(&self, name: &str) -> usize {
        self.category_counts.get(name).copied().unwrap_or(0)
    }

    /// Share of accepted trials, in percent
    pub fn percentage(&self, count: usize) -> f64 {
        percentage(count, self.sim_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_composition_display_and_order() {
        let mut comp = TypeComposition::default();
        comp.add(CardType::Monster);
        comp.add(CardType::Trap);
        comp.add(CardType::Trap);
        assert_eq!(comp.to_string(), "M:1 S:0 T:2");
        assert_eq!(comp.total(), 3);
    }

    #[test]
    fn test_uncategorized_sentinel_is_distinct() {
        let sentinel = CategoryComposition::Uncategorized;
        assert_ne!(sentinel, CategoryComposition::Breakdown(String::new()));
        assert_ne!(
            sentinel,
            CategoryComposition::Breakdown("Uncategorized Hand".to_string())
        );
    }

    #[test]
    fn test_percentage_handles_zero_total() {
        assert_eq!(percentage(3, 0), 0.0);
        assert!((percentage(1, 4) - 25.0).abs() < 1e-12);
        assert_eq!(RunResult::new(10).percentage(5), 0.0);
    }
}
