use crate::card::CardCatalog;
use crate::combo::{ComboRuleSet, InvolvementMap};
use crate::rng::GameRng;
use crate::simulation::deck::{Deck, DeckStats};
use crate::simulation::insights::{Insight, InsightGenerator};
use crate::simulation::results::RunResult;
use crate::simulation::sampler::{HandSampler, SimulationError};
use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often a consumer should drain the message channel
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_TRIALS: usize = 10_000;

/// Worker to consumer notifications
#[derive(Debug)]
pub enum SimMessage {
    Status {
        text: String,
        /// Run progress in percent, absent for phase changes
        percent: Option<f64>,
        /// Label of the deck the update belongs to
        deck: Option<String>,
    },
    Error(String),
    Result(Box<SimulationReport>),
}

impl SimMessage {
    fn status(text: impl Into<String>) -> Self {
        SimMessage::Status {
            text: text.into(),
            percent: None,
            deck: None,
        }
    }
}

/// Shared stop flag, checked between trials
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A deck and the name it is reported under
#[derive(Debug, Clone)]
pub struct DeckInput {
    pub name: String,
    pub deck: Deck,
}

impl DeckInput {
    pub fn new(name: impl Into<String>, deck: Deck) -> Self {
        DeckInput {
            name: name.into(),
            deck,
        }
    }
}

/// Everything a finished job hands back
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub name_a: String,
    pub name_b: Option<String>,
    pub trials: usize,
    pub seed: u64,
    pub result_a: RunResult,
    pub result_b: Option<RunResult>,
    pub deck_a: Deck,
    pub deck_b: Option<Deck>,
    pub stats_a: DeckStats,
    pub stats_b: Option<DeckStats>,
    /// Names of every combo rule the job evaluated
    pub combo_names: Vec<String>,
    /// Empty for single-deck jobs
    pub insights: Vec<Insight>,
    pub generated_at: DateTime<Local>,
}

impl SimulationReport {
    pub fn is_comparison(&self) -> bool {
        self.result_b.is_some()
    }
}

/// One or two deck simulations plus, for two decks, their comparison
#[derive(Clone)]
pub struct SimulationJob {
    pub trials: usize,
    /// Shared by both decks; drawn at random when absent
    pub seed: Option<u64>,
    /// Enforce the deckbuilding size range before simulating
    pub strict: bool,
    pub deck_a: DeckInput,
    pub deck_b: Option<DeckInput>,
    pub catalog: Arc<CardCatalog>,
    pub rules: Arc<ComboRuleSet>,
    pub involvement: Arc<InvolvementMap>,
}

impl SimulationJob {
    pub fn new(deck_a: DeckInput, catalog: Arc<CardCatalog>, rules: Arc<ComboRuleSet>, involvement: Arc<InvolvementMap>) -> Self {
        SimulationJob {
            trials: DEFAULT_TRIALS,
            seed: None,
            strict: false,
            deck_a,
            deck_b: None,
            catalog,
            rules,
            involvement,
        }
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_deck_b(mut self, deck_b: DeckInput) -> Self {
        self.deck_b = Some(deck_b);
        self
    }

    fn check_deck(&self, label: &str, deck: &Deck, events: Option<&Sender<SimMessage>>) -> Result<(), SimulationError> {
        if !self.strict {
            return Ok(());
        }
        deck.validate().map_err(|source| {
            let error = SimulationError::InvalidDeck {
                label: label.to_string(),
                source,
            };
            log::error!("{}", error);
            if let Some(events) = events {
                let _ = events.send(SimMessage::Error(error.to_string()));
            }
            error
        })
    }

    fn sampler(&self, label: &str, events: Option<&Sender<SimMessage>>, cancel: &CancelToken) -> HandSampler<'_> {
        let sampler = HandSampler::new(&self.catalog, &self.rules)
            .with_label(label)
            .with_cancel(cancel.clone());
        match events {
            Some(events) => sampler.with_events(events.clone()),
            None => sampler,
        }
    }

    /// Run the job on the current thread. Two decks are simulated in
    /// parallel from the same seed.
    pub fn run(&self, events: Option<&Sender<SimMessage>>, cancel: &CancelToken) -> Result<SimulationReport, SimulationError> {
        let seed = self.seed.unwrap_or_else(|| GameRng::new(None).seed());
        let notify = |message: SimMessage| {
            if let Some(events) = events {
                let _ = events.send(message);
            }
        };

        self.check_deck("A", &self.deck_a.deck, events)?;
        if let Some(deck_b) = &self.deck_b {
            self.check_deck("B", &deck_b.deck, events)?;
        }

        let sampler_a = self.sampler("A", events, cancel);
        let (result_a, result_b) = match &self.deck_b {
            None => (
                sampler_a.run(&self.deck_a.deck, self.trials, &mut GameRng::new(Some(seed))),
                None,
            ),
            Some(deck_b) => {
                let sampler_b = self.sampler("B", events, cancel);
                let (a, b) = rayon::join(
                    || sampler_a.run(&self.deck_a.deck, self.trials, &mut GameRng::new(Some(seed))),
                    || sampler_b.run(&deck_b.deck, self.trials, &mut GameRng::new(Some(seed))),
                );
                (a, Some(b))
            }
        };
        let result_a = result_a?;
        let result_b = result_b.transpose()?;

        let stats_a = self.deck_a.deck.stats(&self.catalog);
        let stats_b = self.deck_b.as_ref().map(|input| input.deck.stats(&self.catalog));

        let insights = match (&self.deck_b, &result_b) {
            (Some(deck_b), Some(result_b)) => {
                notify(SimMessage::status("Generating insights..."));
                let total_trials = result_a.sim_count.max(result_b.sim_count);
                InsightGenerator::new(&self.catalog, &self.rules, &self.involvement).compare(
                    &result_a,
                    result_b,
                    &self.deck_a.deck,
                    &deck_b.deck,
                    total_trials,
                    &stats_a,
                    stats_b.as_ref(),
                )
            }
            _ => Vec::new(),
        };

        Ok(SimulationReport {
            name_a: self.deck_a.name.clone(),
            name_b: self.deck_b.as_ref().map(|input| input.name.clone()),
            trials: self.trials,
            seed,
            result_a,
            result_b,
            deck_a: self.deck_a.deck.clone(),
            deck_b: self.deck_b.as_ref().map(|input| input.deck.clone()),
            stats_a,
            stats_b,
            combo_names: self.rules.names().map(str::to_string).collect(),
            insights,
            generated_at: Local::now(),
        })
    }

    /// Run on a background thread. The outcome arrives on `events` as a
    /// `Result` message, or as `Error` messages from whichever stage failed.
    pub fn spawn(self, events: Sender<SimMessage>, cancel: CancelToken) -> JoinHandle<()> {
        thread::spawn(move || match self.run(Some(&events), &cancel) {
            Ok(report) => {
                let _ = events.send(SimMessage::Result(Box::new(report)));
            }
            Err(e) => log::debug!("simulation job ended with error: {}", e),
        })
    }
}
