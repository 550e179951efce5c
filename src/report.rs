//! Plain-text rendering of a finished simulation.
//!
//! Six frequency tables (cards, combos, duplicates, type composition,
//! categories, category composition). Comparisons also list per-card copy
//! differences up front and the insight lines at the end. Percentages are taken over the larger of the two
//! accepted trial counts so both columns share a denominator.

use crate::simulation::insights::insight_lines;
use crate::simulation::results::percentage;
use crate::simulation::SimulationReport;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

type Counter = BTreeMap<String, usize>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum RowOrder {
    /// Highest deck A percentage first, ties by key
    ByPercentage,
    ByKey,
}

struct Row {
    key: String,
    a: usize,
    b: Option<usize>,
}

struct Table {
    title: &'static str,
    key_header: &'static str,
    rows: Vec<Row>,
}

impl Table {
    /// One row per key, extended with every key either counter has seen
    fn build<'k>(
        title: &'static str,
        key_header: &'static str,
        order: RowOrder,
        extra_keys: impl IntoIterator<Item = &'k str>,
        a: &'k Counter,
        b: Option<&'k Counter>,
    ) -> Self {
        let keys: BTreeSet<&str> = extra_keys
            .into_iter()
            .chain(a.keys().map(String::as_str))
            .chain(b.into_iter().flat_map(|b| b.keys().map(String::as_str)))
            .collect();
        let count = |counter: &Counter, key: &str| counter.get(key).copied().unwrap_or(0);

        let mut rows: Vec<Row> = keys
            .into_iter()
            .map(|key| Row {
                key: key.to_string(),
                a: count(a, key),
                b: b.map(|b| count(b, key)),
            })
            .collect();
        if order == RowOrder::ByPercentage {
            // Stable: ties stay in key order
            rows.sort_by(|x, y| y.a.cmp(&x.a));
        }

        Table {
            title,
            key_header,
            rows,
        }
    }

    fn write_to(&self, f: &mut fmt::Formatter<'_>, total: usize, comparison: bool) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|row| row.key.chars().count())
            .chain(std::iter::once(self.key_header.len()))
            .max()
            .unwrap_or(0);

        writeln!(f, "--- {} ---", self.title)?;
        if comparison {
            writeln!(
                f,
                "{:<width$}  {:>10} {:>8}  {:>10} {:>8}",
                self.key_header, "Count (A)", "% (A)", "Count (B)", "% (B)"
            )?;
            writeln!(f, "{}", "-".repeat(width + 42))?;
        } else {
            writeln!(f, "{:<width$}  {:>10} {:>10}", self.key_header, "Count", "Percentage")?;
            writeln!(f, "{}", "-".repeat(width + 23))?;
        }

        if self.rows.is_empty() {
            writeln!(f, "(none)")?;
        }
        for row in &self.rows {
            let pct_a = format!("{:.2}%", percentage(row.a, total));
            if comparison {
                let b = row.b.unwrap_or(0);
                let pct_b = format!("{:.2}%", percentage(b, total));
                writeln!(
                    f,
                    "{:<width$}  {:>10} {:>8}  {:>10} {:>8}",
                    row.key, row.a, pct_a, b, pct_b
                )?;
            } else {
                writeln!(f, "{:<width$}  {:>10} {:>10}", row.key, row.a, pct_a)?;
            }
        }
        writeln!(f)
    }
}

/// Re-key a counter by its display form
fn by_display<K: Display>(counter: &BTreeMap<K, usize>) -> Counter {
    counter.iter().map(|(key, count)| (key.to_string(), *count)).collect()
}

/// `12345` -> `12,345`
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Render the whole report
pub fn render(report: &SimulationReport) -> String {
    Rendered(report).to_string()
}

struct Rendered<'r>(&'r SimulationReport);

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let a = &report.result_a;
        let b = report.result_b.as_ref();
        let comparison = b.is_some();
        let total = b.map_or(a.sim_count, |b| a.sim_count.max(b.sim_count));

        let title = if comparison {
            "Deck Analysis - Comparison"
        } else {
            "Deck Analysis"
        };
        writeln!(f, "=== {} ===", title)?;
        writeln!(f, "Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Deck A: {}", report.name_a)?;
        if let Some(name_b) = &report.name_b {
            writeln!(f, "Deck B: {}", name_b)?;
        }
        writeln!(f, "Simulations: {}", group_thousands(total))?;
        writeln!(f, "Seed: {}", report.seed)?;
        for (label, result) in std::iter::once(("A", a)).chain(b.map(|b| ("B", b))) {
            if result.cancelled {
                writeln!(
                    f,
                    "Note: Deck {} was cancelled after {} of {} trials",
                    label, result.sim_count, result.requested
                )?;
            }
        }
        writeln!(f)?;

        if let Some(deck_b) = &report.deck_b {
            writeln!(f, "--- Deck Differences ---")?;
            let differences = report.deck_a.differences(deck_b);
            if differences.is_empty() {
                writeln!(f, "No differences.")?;
            }
            for difference in &differences {
                writeln!(f, "{}", difference)?;
            }
            writeln!(f)?;
        }

        let deck_cards = report
            .deck_a
            .names()
            .chain(report.deck_b.iter().flat_map(|deck| deck.names()));
        let combos = report.combo_names.iter().map(String::as_str);
        let comp_a = by_display(&a.composition_counts);
        let comp_b = b.map(|b| by_display(&b.composition_counts));
        let cat_comp_a = by_display(&a.category_composition_counts);
        let cat_comp_b = b.map(|b| by_display(&b.category_composition_counts));

        let tables = [
            Table::build(
                "Individual Card Frequency",
                "Card",
                RowOrder::ByPercentage,
                deck_cards,
                &a.card_counts,
                b.map(|b| &b.card_counts),
            ),
            Table::build(
                "Combo Frequency",
                "Combo",
                RowOrder::ByPercentage,
                combos,
                &a.combo_counts,
                b.map(|b| &b.combo_counts),
            ),
            Table::build(
                "Duplicate Card Frequency (Opening Hand)",
                "Card",
                RowOrder::ByPercentage,
                [],
                &a.duplicate_counts,
                b.map(|b| &b.duplicate_counts),
            ),
            Table::build(
                "Opening Hand Composition (M/S/T)",
                "Composition",
                RowOrder::ByPercentage,
                [],
                &comp_a,
                comp_b.as_ref(),
            ),
            Table::build(
                "Individual Category Frequency (Avg per Hand)",
                "Category",
                RowOrder::ByKey,
                [],
                &a.category_counts,
                b.map(|b| &b.category_counts),
            ),
            Table::build(
                "Hand Category Composition",
                "Category Composition",
                RowOrder::ByPercentage,
                [],
                &cat_comp_a,
                cat_comp_b.as_ref(),
            ),
        ];
        for table in &tables {
            table.write_to(f, total, comparison)?;
        }

        if comparison {
            writeln!(f, "=== Insights and Analysis ===")?;
            if report.insights.is_empty() {
                writeln!(f, "No insights generated.")?;
            }
            for line in insight_lines(&report.insights) {
                writeln!(f, "{}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::deck::{Deck, DeckStats};
    use crate::simulation::results::{CategoryComposition, RunResult, TypeComposition};
    use chrono::Local;

    fn report() -> SimulationReport {
        let mut result = RunResult::new(4);
        result.sim_count = 4;
        result.card_counts.insert("Trap Trick".to_string(), 1);
        result.card_counts.insert("Welcome Labrynth".to_string(), 3);
        result.combo_counts.insert("Rare Line".to_string(), 1);
        result.category_counts.insert("Starter".to_string(), 2);
        result.category_counts.insert("Extender".to_string(), 1);
        result.composition_counts.insert(
            TypeComposition {
                monsters: 2,
                spells: 0,
                traps: 3,
            },
            4,
        );
        result
            .category_composition_counts
            .insert(CategoryComposition::Uncategorized, 4);

        SimulationReport {
            name_a: "Main".to_string(),
            name_b: None,
            trials: 4,
            seed: 7,
            result_a: result,
            result_b: None,
            deck_a: Deck::from_counts([("Trap Trick", 1), ("Welcome Labrynth", 3), ("Dominus Impulse", 1)]),
            deck_b: None,
            stats_a: DeckStats::default(),
            stats_b: None,
            combo_names: vec!["Never Drawn".to_string(), "Rare Line".to_string()],
            insights: Vec::new(),
            generated_at: Local::now(),
        }
    }

    fn section<'a>(text: &'a str, title: &str) -> Vec<&'a str> {
        text.split(&format!("--- {} ---\n", title))
            .nth(1)
            .unwrap_or("")
            .lines()
            .skip(2)
            .take_while(|line| !line.is_empty())
            .collect()
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(10_000), "10,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_single_report_tables() {
        let text = render(&report());
        assert!(text.starts_with("=== Deck Analysis ===\n"));
        assert!(text.contains("Simulations: 4\n"));
        assert!(!text.contains("Insights"));

        let cards = section(&text, "Individual Card Frequency");
        assert_eq!(cards.len(), 3, "zero-count deck cards are listed");
        assert!(cards[0].starts_with("Welcome Labrynth"));
        assert!(cards[0].ends_with("75.00%"));
        assert!(cards[2].starts_with("Dominus Impulse"));

        let combos = section(&text, "Combo Frequency");
        assert!(combos[0].starts_with("Rare Line"));
        assert!(combos[1].starts_with("Never Drawn"));

        let categories = section(&text, "Individual Category Frequency (Avg per Hand)");
        assert!(categories[0].starts_with("Extender"));
        assert!(categories[1].starts_with("Starter"));

        assert_eq!(section(&text, "Duplicate Card Frequency (Opening Hand)"), vec!["(none)"]);
        assert!(section(&text, "Opening Hand Composition (M/S/T)")[0].starts_with("M:2 S:0 T:3"));
        assert!(section(&text, "Hand Category Composition")[0].starts_with("Uncategorized Hand"));
    }

    #[test]
    fn test_comparison_report_columns() {
        let mut report = report();
        let mut other = report.result_a.clone();
        other.card_counts.insert("Trap Trick".to_string(), 4);
        report.result_b = Some(other);
        report.name_b = Some("Variant".to_string());
        report.deck_b = Some(report.deck_a.clone());

        let text = render(&report);
        assert!(text.starts_with("=== Deck Analysis - Comparison ===\n"));
        assert!(text.contains("Deck B: Variant\n"));
        assert!(text.contains("Count (B)"));
        let cards = section(&text, "Individual Card Frequency");
        let trick = cards
            .iter()
            .find(|line| line.starts_with("Trap Trick"))
            .expect("row present");
        assert!(trick.contains("25.00%"));
        assert!(trick.ends_with("100.00%"));
        assert!(text.contains("=== Insights and Analysis ===\nNo insights generated.\n"));
        assert!(text.contains("--- Deck Differences ---\nNo differences.\n"));
    }

    #[test]
    fn test_comparison_lists_deck_differences() {
        let mut report = report();
        report.result_b = Some(report.result_a.clone());
        report.name_b = Some("Variant".to_string());
        report.deck_b = Some(Deck::from_counts([
            ("Trap Trick", 3),
            ("Welcome Labrynth", 1),
            ("Ash Blossom & Joyous Spring", 2),
        ]));

        let text = render(&report);
        let lines: Vec<&str> = text
            .split("--- Deck Differences ---\n")
            .nth(1)
            .unwrap_or("")
            .lines()
            .take_while(|line| !line.is_empty())
            .collect();
        assert_eq!(
            lines,
            vec![
                "+2 Ash Blossom & Joyous Spring (B has more)",
                "-1 Dominus Impulse (A has more)",
                "+2 Trap Trick (B has more)",
                "-2 Welcome Labrynth (A has more)",
            ]
        );
        assert!(!render(&self::report()).contains("Deck Differences"));
    }
}
