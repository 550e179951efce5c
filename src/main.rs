use clap::{Parser, Subcommand};
use combo_odds::card::CardCatalog;
use combo_odds::combo::defaults::{default_definitions, default_involvement};
use combo_odds::combo::{ComboRuleSet, Rule};
use combo_odds::report;
use combo_odds::simulation::{
    parse_deck_file, CancelToken, DeckInput, SimMessage, SimulationJob, SimulationReport, DEFAULT_TRIALS,
    POLL_INTERVAL,
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "combo-odds")]
#[command(about = "Opening hand combo probability simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Card catalog JSON (built-in card pool if omitted)
    #[arg(long, global = true)]
    cards: Option<String>,

    /// Card pool overlay JSON (added_cards, removed_cards, type_overrides)
    #[arg(long, global = true)]
    card_overrides: Option<String>,

    /// Category assignments JSON ({"Card": ["Tag", ...]})
    #[arg(long, global = true)]
    categories: Option<String>,

    /// Custom combo definitions JSON, merged over the built-in combos
    #[arg(long, global = true)]
    combos: Option<String>,

    /// Reject decks outside the 40-60 card range
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate opening hands for one deck
    Simulate {
        /// Deck file (.json or "N Card Name" text)
        #[arg(short, long)]
        deck: String,

        /// Number of hands to draw
        #[arg(short = 'n', long, default_value_t = DEFAULT_TRIALS)]
        trials: usize,

        /// Seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Compare two decks hand for hand
    Compare {
        /// First deck file (Deck A)
        deck_a: String,

        /// Second deck file (Deck B)
        deck_b: String,

        /// Number of hands to draw per deck
        #[arg(short = 'n', long, default_value_t = DEFAULT_TRIALS)]
        trials: usize,

        /// Seed shared by both decks
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// List the combo rules in effect
    Combos,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let catalog = load_catalog(&cli);
    let rules = load_rules(&cli);

    match &cli.command {
        Commands::Simulate { deck, trials, seed } => {
            let job = SimulationJob::new(
                load_deck(deck, &catalog),
                Arc::new(catalog),
                Arc::new(rules),
                Arc::new(default_involvement()),
            )
            .with_trials(*trials)
            .with_seed(*seed)
            .with_strict(cli.strict);
            let report = run_job(job);
            print!("{}", report::render(&report));
        }
        Commands::Compare {
            deck_a,
            deck_b,
            trials,
            seed,
        } => {
            let input_a = load_deck(deck_a, &catalog);
            let input_b = load_deck(deck_b, &catalog);
            let job = SimulationJob::new(
                input_a,
                Arc::new(catalog),
                Arc::new(rules),
                Arc::new(default_involvement()),
            )
            .with_deck_b(input_b)
            .with_trials(*trials)
            .with_seed(*seed)
            .with_strict(cli.strict);
            let report = run_job(job);
            print!("{}", report::render(&report));
        }
        Commands::Combos => list_combos(&rules, &catalog),
    }
}

fn load_catalog(cli: &Cli) -> CardCatalog {
    let mut catalog = match &cli.cards {
        Some(path) => match CardCatalog::from_file(path) {
            Ok(catalog) => {
                eprintln!("✓ Loaded {} cards from {}", catalog.card_count(), path);
                catalog
            }
            Err(e) => {
                eprintln!("✗ Failed to load cards from '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => CardCatalog::builtin(),
    };

    if let Some(path) = &cli.card_overrides {
        match catalog.load_overrides(path) {
            Ok(count) => eprintln!("✓ Applied card overrides from {} ({} cards)", path, count),
            Err(e) => {
                eprintln!("✗ Failed to load card overrides from '{}': {}", path, e);
                std::process::exit(1);
            }
        }
    }

    if let Some(path) = &cli.categories {
        match catalog.load_categories(path) {
            Ok(count) => eprintln!("✓ Applied categories to {} cards from {}", count, path),
            Err(e) => {
                eprintln!("✗ Failed to load categories from '{}': {}", path, e);
                std::process::exit(1);
            }
        }
    }
    catalog
}

fn load_rules(cli: &Cli) -> ComboRuleSet {
    let mut rules = ComboRuleSet::with_defaults();
    if let Some(path) = &cli.combos {
        match rules.load_overrides(path) {
            Ok(count) => eprintln!("✓ Loaded {} custom combos from {}", count, path),
            Err(e) => {
                eprintln!("✗ Failed to load custom combos from '{}': {}", path, e);
                std::process::exit(1);
            }
        }
    }
    rules
}

fn load_deck(path: &str, catalog: &CardCatalog) -> DeckInput {
    match parse_deck_file(path, catalog) {
        Ok(deck) => {
            eprintln!("✓ Loaded deck {} ({} cards)", path, deck.total());
            DeckInput::new(path, deck)
        }
        Err(e) => {
            eprintln!("✗ Failed to parse deck file '{}': {}", path, e);
            std::process::exit(1);
        }
    }
}

fn progress_bar(progress: &MultiProgress, label: &str) -> ProgressBar {
    let style = ProgressStyle::with_template("Deck {prefix} [{bar:40}] {pos:>3}%")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let bar = progress.add(ProgressBar::new(100));
    bar.set_style(style);
    bar.set_prefix(label.to_string());
    bar
}

/// Start the job on a worker thread and poll its channel until it finishes
fn run_job(job: SimulationJob) -> SimulationReport {
    let (tx, rx) = mpsc::channel();
    let handle = job.spawn(tx, CancelToken::new());

    let progress = MultiProgress::new();
    let mut bars: BTreeMap<String, ProgressBar> = BTreeMap::new();
    let mut report = None;
    let mut failed = false;

    loop {
        match rx.try_recv() {
            Ok(SimMessage::Status {
                text,
                percent,
                deck,
            }) => match (deck, percent) {
                (Some(deck), Some(percent)) => {
                    let bar = bars
                        .entry(deck)
                        .or_insert_with_key(|label| progress_bar(&progress, label));
                    bar.set_position(percent.round() as u64);
                }
                _ => {
                    let _ = progress.println(text);
                }
            },
            Ok(SimMessage::Error(text)) => {
                let _ = progress.println(format!("✗ {}", text));
                failed = true;
            }
            Ok(SimMessage::Result(result)) => report = Some(*result),
            Err(TryRecvError::Empty) => std::thread::sleep(POLL_INTERVAL),
            Err(TryRecvError::Disconnected) => break,
        }
    }

    for bar in bars.values() {
        bar.finish_and_clear();
    }
    if handle.join().is_err() {
        eprintln!("✗ Simulation worker panicked");
        std::process::exit(1);
    }

    match report {
        Some(report) => report,
        None => {
            if !failed {
                eprintln!("✗ Simulation ended without a result");
            }
            std::process::exit(1);
        }
    }
}

fn describe(card: &str, catalog: &CardCatalog) -> String {
    match catalog.get_card(card) {
        Ok(card) => format!("{} [{}]", card.name(), card.card_type),
        Err(_) => format!("{} [not in catalog]", card),
    }
}

fn list_combos(rules: &ComboRuleSet, catalog: &CardCatalog) {
    let definitions = default_definitions();
    println!("\n=== Combo Rules ({}) ===\n", rules.len());
    for (name, rule) in rules.iter() {
        let structured = match rule {
            Rule::Structured(combo) => Some(combo),
            Rule::Predicate(_) => definitions.get(name),
        };
        println!("{}", name);
        match structured {
            Some(combo) => {
                if !combo.must_have.is_empty() {
                    let cards: Vec<String> = combo.must_have.iter().map(|c| describe(c, catalog)).collect();
                    println!("  must have:   {}", cards.join(", "));
                }
                for group in &combo.need_one_groups {
                    let cards: Vec<String> = group.iter().map(|c| describe(c, catalog)).collect();
                    println!("  one of:      {}", cards.join(" | "));
                }
            }
            None => println!("  (custom predicate)"),
        }
    }
}
