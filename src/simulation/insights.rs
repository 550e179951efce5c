use crate::card::CardCatalog;
use crate::combo::{ComboRuleSet, InvolvementMap};
use crate::simulation::deck::{Deck, DeckStats};
use crate::simulation::results::{percentage, RunResult};
use std::collections::BTreeSet;
use std::fmt;

/// Percentage-point gap under which two combo rates count as equal
pub const COMBO_SIMILARITY: f64 = 0.01;
/// Percentage-point gap under which two category frequencies count as equal
pub const CATEGORY_SIMILARITY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckLabel {
    A,
    B,
}

impl DeckLabel {
    pub fn other(self) -> Self {
        match self {
            DeckLabel::A => DeckLabel::B,
            DeckLabel::B => DeckLabel::A,
        }
    }
}

impl fmt::Display for DeckLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckLabel::A => f.write_str("A"),
            DeckLabel::B => f.write_str("B"),
        }
    }
}

/// One line of a two-deck comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Insight {
    ComboSimilar {
        combo: String,
        percent: f64,
    },
    ComboHigher {
        combo: String,
        better: DeckLabel,
        better_percent: f64,
        worse_percent: f64,
    },
    /// The worse deck runs fewer copies of an involved card
    AddCopies {
        combo: String,
        card: String,
        worse: DeckLabel,
        worse_copies: usize,
        better_copies: usize,
    },
    /// The better deck gets there with fewer copies of an involved card
    FewerInBetter {
        combo: String,
        card: String,
        better: DeckLabel,
        better_copies: usize,
        worse_copies: usize,
    },
    Blank,
    SectionHeader(&'static str),
    CategorySimilar {
        category: String,
        percent: f64,
    },
    CategoryHigher {
        category: String,
        better: DeckLabel,
        better_percent: f64,
        worse_percent: f64,
    },
    Composition {
        label: DeckLabel,
        stats: DeckStats,
    },
    NoSimulations,
}

pub const CATEGORY_HEADER: &str = "--- Category Frequency Comparison (Avg per Hand) ---";
pub const COMPOSITION_HEADER: &str = "--- Deck Composition Ratios ---";

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::ComboSimilar { combo, percent } => {
                write!(f, "'{}': Similar draw chance ({:.2}%).", combo, percent)
            }
            Insight::ComboHigher {
                combo,
                better,
                better_percent,
                worse_percent,
            } => write!(
                f,
                "'{}': Deck {} higher ({:.2}%) vs Deck {} ({:.2}%).",
                combo,
                better,
                better_percent,
                better.other(),
                worse_percent
            ),
            Insight::AddCopies {
                combo,
                card,
                worse,
                worse_copies,
                better_copies,
            } => write!(
                f,
                "-> Consider +{} '{}' in Deck {} (has {}, Deck {} has {}) for '{}'.",
                better_copies.abs_diff(*worse_copies),
                card,
                worse,
                worse_copies,
                worse.other(),
                better_copies,
                combo
            ),
            Insight::FewerInBetter {
                combo,
                card,
                better,
                better_copies,
                worse_copies,
            } => write!(
                f,
                "-> Note: Deck {} (better for '{}') uses {} fewer '{}' ({}) than Deck {} ({}).",
                better,
                combo,
                worse_copies.abs_diff(*better_copies),
                card,
                better_copies,
                better.other(),
                worse_copies
            ),
            Insight::Blank => Ok(()),
            Insight::SectionHeader(header) => f.write_str(header),
            Insight::CategorySimilar { category, percent } => {
                write!(f, "'{}': Similar avg frequency (~{:.2}%).", category, percent)
            }
            Insight::CategoryHigher {
                category,
                better,
                better_percent,
                worse_percent,
            } => write!(
                f,
                "'{}': Deck {} higher avg ({:.2}%) vs Deck {} ({:.2}%).",
                category,
                better,
                better_percent,
                better.other(),
                worse_percent
            ),
            Insight::Composition { label, stats } => write!(
                f,
                "Deck {} ({} cards): {} M ({:.1}%) / {} S ({:.1}%) / {} T ({:.1}%)",
                label,
                stats.total,
                stats.monsters,
                stats.ratio(stats.monsters),
                stats.spells,
                stats.ratio(stats.spells),
                stats.traps,
                stats.ratio(stats.traps)
            ),
            Insight::NoSimulations => f.write_str("No simulations run."),
        }
    }
}

/// Builds the comparison between two runs
pub struct InsightGenerator<'a> {
    catalog: &'a CardCatalog,
    rules: &'a ComboRuleSet,
    involvement: &'a InvolvementMap,
}

impl<'a> InsightGenerator<'a> {
    pub fn new(catalog: &'a CardCatalog, rules: &'a ComboRuleSet, involvement: &'a InvolvementMap) -> Self {
        InsightGenerator {
            catalog,
            rules,
            involvement,
        }
    }

    /// Combo lines, a blank line, category lines, then composition ratios.
    /// Percentages are taken over `total_trials`; a missing `stats_b` is
    /// reported as an empty deck.
    #[allow(clippy::too_many_arguments)]
    pub fn compare(
        &self,
        result_a: &RunResult,
        result_b: &RunResult,
        deck_a: &Deck,
        deck_b: &Deck,
        total_trials: usize,
        stats_a: &DeckStats,
        stats_b: Option<&DeckStats>,
    ) -> Vec<Insight> {
        if total_trials == 0 {
            return vec![Insight::NoSimulations];
        }

        let mut insights = Vec::new();

        let combos: BTreeSet<&str> = self
            .rules
            .names()
            .chain(result_a.combo_counts.keys().map(String::as_str))
            .chain(result_b.combo_counts.keys().map(String::as_str))
            .collect();

        for combo in combos {
            let pct_a = percentage(result_a.combo_count(combo), total_trials);
            let pct_b = percentage(result_b.combo_count(combo), total_trials);

            if (pct_a - pct_b).abs() < COMBO_SIMILARITY {
                insights.push(Insight::ComboSimilar {
                    combo: combo.to_string(),
                    percent: pct_a,
                });
                continue;
            }

            let (better, better_pct, worse_pct, better_deck, worse_deck) = if pct_a > pct_b {
                (DeckLabel::A, pct_a, pct_b, deck_a, deck_b)
            } else {
                (DeckLabel::B, pct_b, pct_a, deck_b, deck_a)
            };
            insights.push(Insight::ComboHigher {
                combo: combo.to_string(),
                better,
                better_percent: better_pct,
                worse_percent: worse_pct,
            });
            insights.extend(self.recommendations(combo, better, better_deck, worse_deck));
        }
        insights.push(Insight::Blank);

        insights.push(Insight::SectionHeader(CATEGORY_HEADER));
        let categories: BTreeSet<&str> = result_a
            .category_counts
            .keys()
            .chain(result_b.category_counts.keys())
            .map(String::as_str)
            .collect();
        for category in categories {
            let pct_a = percentage(result_a.category_count(category), total_trials);
            let pct_b = percentage(result_b.category_count(category), total_trials);
            let category = category.to_string();
            insights.push(if (pct_a - pct_b).abs() < CATEGORY_SIMILARITY {
                Insight::CategorySimilar {
                    category,
                    percent: pct_a,
                }
            } else if pct_a > pct_b {
                Insight::CategoryHigher {
                    category,
                    better: DeckLabel::A,
                    better_percent: pct_a,
                    worse_percent: pct_b,
                }
            } else {
                Insight::CategoryHigher {
                    category,
                    better: DeckLabel::B,
                    better_percent: pct_b,
                    worse_percent: pct_a,
                }
            });
        }

        insights.push(Insight::SectionHeader(COMPOSITION_HEADER));
        insights.push(Insight::Composition {
            label: DeckLabel::A,
            stats: *stats_a,
        });
        insights.push(Insight::Composition {
            label: DeckLabel::B,
            stats: stats_b.copied().unwrap_or_default(),
        });

        insights
    }

    /// Copy-count advice for the cards a combo depends on
    fn recommendations(&self, combo: &str, better: DeckLabel, better_deck: &Deck, worse_deck: &Deck) -> Vec<Insight> {
        let Some(cards) = self.involvement.get(combo) else {
            return Vec::new();
        };

        cards
            .iter()
            .filter(|card| self.catalog.contains(card))
            .filter_map(|card| {
                let better_copies = better_deck.copies(card);
                let worse_copies = worse_deck.copies(card);
                if better_copies > worse_copies {
                    Some(Insight::AddCopies {
                        combo: combo.to_string(),
                        card: card.clone(),
                        worse: better.other(),
                        worse_copies,
                        better_copies,
                    })
                } else if better_copies < worse_copies {
                    Some(Insight::FewerInBetter {
                        combo: combo.to_string(),
                        card: card.clone(),
                        better,
                        better_copies,
                        worse_copies,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Render insights as text lines
pub fn insight_lines(insights: &[Insight]) -> Vec<String> {
    insights.iter().map(Insight::to_string).collect()
}
