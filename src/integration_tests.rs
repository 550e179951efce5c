//! End-to-end runs over the bundled sample decks and data files
//! Tests loading, simulation, comparison and report rendering with known seeds

use crate::card::CardCatalog;
use crate::combo::defaults::{default_involvement, ARIAS_DISRUPTION, LADY};
use crate::combo::ComboRuleSet;
use crate::report;
use crate::rng::GameRng;
use crate::simulation::deck::{parse_deck_json, parse_deck_str, Deck};
use crate::simulation::insights::{DeckLabel, Insight, CATEGORY_HEADER, COMPOSITION_HEADER};
use crate::simulation::{CancelToken, DeckInput, HandSampler, SimMessage, SimulationJob, POLL_INTERVAL};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;

const LABRYNTH_TXT: &str = include_str!("../decks/labrynth.txt");
const LABRYNTH_TRAPS_JSON: &str = include_str!("../decks/labrynth_traps.json");
const CATEGORIES_JSON: &str = include_str!("../data/card_categories.json");
const CUSTOM_COMBOS_JSON: &str = include_str!("../data/custom_combos.json");

fn catalog() -> CardCatalog {
    let mut catalog = CardCatalog::builtin();
    catalog
        .apply_categories_json(CATEGORIES_JSON)
        .expect("Failed to apply categories");
    catalog
}

fn rules() -> ComboRuleSet {
    let mut rules = ComboRuleSet::with_defaults();
    rules.merge(ComboRuleSet::from_json(CUSTOM_COMBOS_JSON).expect("Failed to parse custom combos"));
    rules
}

fn furniture_deck() -> Deck {
    parse_deck_str(LABRYNTH_TXT).expect("Failed to parse deck")
}

fn trap_deck() -> Deck {
    parse_deck_json(LABRYNTH_TRAPS_JSON).expect("Failed to parse deck")
}

fn job(deck_a: Deck, deck_b: Option<Deck>, seed: u64) -> SimulationJob {
    let job = SimulationJob::new(
        DeckInput::new("labrynth.txt", deck_a),
        Arc::new(catalog()),
        Arc::new(rules()),
        Arc::new(default_involvement()),
    )
    .with_trials(5000)
    .with_seed(Some(seed))
    .with_strict(true);
    match deck_b {
        Some(deck_b) => job.with_deck_b(DeckInput::new("labrynth_traps.json", deck_b)),
        None => job,
    }
}

#[test]
fn test_sample_data_is_valid() {
    let catalog = catalog();
    for deck in [furniture_deck(), trap_deck()] {
        deck.validate().expect("sample decks are tournament legal");
        assert!(deck.names().all(|name| catalog.contains(name)));
    }
    // Legacy single-string category
    assert_eq!(catalog.categories("Trap Trick"), ["Enabler".to_string()]);
    assert_eq!(rules().len(), 7);
}

#[test]
fn test_same_seed_produces_same_result() {
    let catalog = catalog();
    let rules = rules();
    let sampler = HandSampler::new(&catalog, &rules);
    let deck = furniture_deck();

    let first = sampler
        .run(&deck, 2000, &mut GameRng::new(Some(54321)))
        .expect("run should succeed");
    let second = sampler
        .run(&deck, 2000, &mut GameRng::new(Some(54321)))
        .expect("run should succeed");
    assert_eq!(first, second, "Same seed should produce same counters");

    let other = sampler
        .run(&deck, 2000, &mut GameRng::new(Some(12345)))
        .expect("run should succeed");
    assert_ne!(first.card_counts, other.card_counts, "Different seeds should differ");
}

#[test]
fn test_identical_decks_are_similar_everywhere() {
    let report = job(furniture_deck(), Some(furniture_deck()), 777)
        .run(None, &CancelToken::new())
        .expect("job should succeed");

    for insight in &report.insights {
        assert!(
            !matches!(
                insight,
                Insight::ComboHigher { .. }
                    | Insight::CategoryHigher { .. }
                    | Insight::AddCopies { .. }
                    | Insight::FewerInBetter { .. }
            ),
            "unexpected verdict: {}",
            insight
        );
    }

    // Every rule gets exactly one line, in name order
    let combos: Vec<&str> = report
        .insights
        .iter()
        .filter_map(|i| match i {
            Insight::ComboSimilar { combo, .. } => Some(combo.as_str()),
            _ => None,
        })
        .collect();
    let mut sorted = combos.clone();
    sorted.sort_unstable();
    assert_eq!(combos, sorted);
    assert_eq!(combos.len(), 7);
}

#[test]
fn test_comparison_sections_and_recommendations() {
    let report = job(furniture_deck(), Some(trap_deck()), 2024)
        .run(None, &CancelToken::new())
        .expect("job should succeed");
    let lines: Vec<String> = report.insights.iter().map(|i| i.to_string()).collect();

    let blank = lines.iter().position(|l| l.is_empty()).expect("blank separator");
    let category = lines.iter().position(|l| l == CATEGORY_HEADER).expect("category header");
    let composition = lines.iter().position(|l| l == COMPOSITION_HEADER).expect("composition header");
    assert_eq!(category, blank + 1);
    assert!(composition > category);
    assert_eq!(lines.len(), composition + 3);
    assert_eq!(lines[composition + 1], "Deck A (44 cards): 20 M (45.5%) / 4 S (9.1%) / 20 T (45.5%)");
    assert!(lines[composition + 2].starts_with("Deck B (42 cards): "));

    // Deck B runs three disruption traps of each kind against Deck A's two
    let arias = report
        .insights
        .iter()
        .find(|i| matches!(i, Insight::ComboHigher { combo, .. } if combo == ARIAS_DISRUPTION));
    assert!(
        matches!(arias, Some(Insight::ComboHigher { better: DeckLabel::B, .. })),
        "expected Deck B ahead on Arias, got {:?}",
        arias
    );
    assert!(lines.contains(
        &"-> Consider +1 'Dimensional Barrier' in Deck A (has 2, Deck B has 3) for 'Arias + Disruption Trap'."
            .to_string()
    ));

    // Custom combos never get recommendations
    assert!(!lines
        .iter()
        .any(|l| l.starts_with("->") && l.contains("'Double Handtrap'")));
}

#[test]
fn test_combo_percentages_are_bounded() {
    let report = job(furniture_deck(), Some(trap_deck()), 99)
        .run(None, &CancelToken::new())
        .expect("job should succeed");
    for insight in &report.insights {
        match insight {
            Insight::ComboSimilar { percent, .. } => assert!((0.0..=100.0).contains(percent)),
            Insight::ComboHigher {
                better_percent,
                worse_percent,
                ..
            } => {
                assert!(better_percent > worse_percent);
                assert!(*better_percent <= 100.0);
                assert!(*worse_percent >= 0.0);
            }
            _ => {}
        }
    }
    let lady = report.result_a.combo_count(LADY);
    assert!(lady > 0 && lady < report.result_a.sim_count);
}

#[test]
fn test_background_job_with_polling_consumer() {
    let (tx, rx) = mpsc::channel();
    let handle = job(furniture_deck(), Some(trap_deck()), 5).spawn(tx, CancelToken::new());

    let mut statuses = 0;
    let mut result = None;
    loop {
        match rx.try_recv() {
            Ok(SimMessage::Status { .. }) => statuses += 1,
            Ok(SimMessage::Error(text)) => panic!("unexpected error: {}", text),
            Ok(SimMessage::Result(report)) => result = Some(report),
            Err(TryRecvError::Empty) => std::thread::sleep(POLL_INTERVAL),
            Err(TryRecvError::Disconnected) => break,
        }
    }
    handle.join().expect("worker should not panic");

    let report = result.expect("a result message");
    assert!(statuses > 0);
    assert_eq!(report.result_a.sim_count, 5000);
    assert_eq!(report.result_b.as_ref().map(|r| r.sim_count), Some(5000));

    let text = report::render(&report);
    assert!(text.contains("Deck A: labrynth.txt"));
    assert!(text.contains("Deck B: labrynth_traps.json"));
    assert!(text.contains("--- Deck Differences ---\n"));
    assert!(text.contains("\n+1 Dimensional Barrier (B has more)\n"));
    assert!(text.contains("Simulations: 5,000"));
    assert!(text.contains("--- Hand Category Composition ---"));
    assert!(text.contains("=== Insights and Analysis ==="));
}
