use crate::card::CardCatalog;
use crate::combo::ComboRuleSet;
use crate::rng::GameRng;
use crate::simulation::deck::Deck;
use crate::simulation::hand::{HandTally, HAND_SIZE};
use crate::simulation::pipeline::{CancelToken, SimMessage};
use crate::simulation::results::RunResult;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Deck {label} has only {total} cards, cannot draw 5")]
    DeckTooSmall { label: String, total: usize },
    #[error("Deck {label} invalid for simulation: {source}")]
    InvalidDeck {
        label: String,
        #[source]
        source: crate::simulation::deck::DeckError,
    },
    #[error("No simulations completed for Deck {label}")]
    NoTrialsCompleted { label: String },
    #[error("Simulation of Deck {label} cancelled before any hand was counted")]
    Cancelled { label: String },
}

/// Monte Carlo opening-hand sampler for one deck at a time
pub struct HandSampler<'a> {
    catalog: &'a CardCatalog,
    rules: &'a ComboRuleSet,
    label: String,
    events: Option<Sender<SimMessage>>,
    cancel: Option<CancelToken>,
}

impl<'a> HandSampler<'a> {
    pub fn new(catalog: &'a CardCatalog, rules: &'a ComboRuleSet) -> Self {
        HandSampler {
            catalog,
            rules,
            label: "A".to_string(),
            events: None,
            cancel: None,
        }
    }

    /// Deck label used in messages
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Channel for status and error notifications
    pub fn with_events(mut self, events: Sender<SimMessage>) -> Self {
        self.events = Some(events);
        self
    }

    /// Checked between trials; a cancelled run keeps what it counted so far
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn emit(&self, message: SimMessage) {
        if let Some(events) = &self.events {
            // A caller that hung up just stops receiving updates
            let _ = events.send(message);
        }
    }

    fn fail(&self, error: SimulationError) -> SimulationError {
        log::error!("{}", error);
        self.emit(SimMessage::Error(error.to_string()));
        error
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Draw `trials` independent hands from `deck` and count them
    pub fn run(&self, deck: &Deck, trials: usize, rng: &mut GameRng) -> Result<RunResult, SimulationError> {
        let total = deck.total();
        if total < HAND_SIZE {
            return Err(self.fail(SimulationError::DeckTooSmall {
                label: self.label.clone(),
                total,
            }));
        }

        for name in deck.names().filter(|name| !self.catalog.contains(name)) {
            log::warn!(
                "deck {}: card '{}' not in catalog, counted as unknown type and uncategorized",
                self.label,
                name
            );
        }

        log::info!(
            "simulating deck {} ({} cards, {} trials, seed {})",
            self.label,
            total,
            trials,
            rng.seed()
        );

        let mut population = deck.expand();
        let mut result = RunResult::new(trials);
        let update_interval = (trials / 100).max(1);

        for i in 0..trials {
            if self.is_cancelled() {
                log::info!("deck {} cancelled after {} trials", self.label, i);
                result.cancelled = true;
                break;
            }

            let hand = rng.shuffle_prefix(&mut population, HAND_SIZE);
            match HandTally::from_hand(hand, self.rules, self.catalog) {
                Ok(tally) => result.record(&tally),
                Err(e) => log::warn!("trial {} for deck {} skipped: {}", i + 1, self.label, e),
            }

            if (i + 1) % update_interval == 0 {
                let percent = (i + 1) as f64 / trials as f64 * 100.0;
                self.emit(SimMessage::Status {
                    text: format!("Simulating Deck {}... {:.0}%", self.label, percent),
                    percent: Some(percent),
                    deck: Some(self.label.clone()),
                });
            }
        }

        if result.sim_count == 0 {
            let label = self.label.clone();
            return Err(self.fail(if result.cancelled {
                SimulationError::Cancelled { label }
            } else {
                SimulationError::NoTrialsCompleted { label }
            }));
        }

        log::info!(
            "deck {}: {} of {} trials counted",
            self.label,
            result.sim_count,
            trials
        );
        Ok(result)
    }
}
