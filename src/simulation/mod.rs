pub mod deck;
pub mod hand;
pub mod insights;
pub mod pipeline;
pub mod results;
pub mod sampler;

pub use deck::{parse_deck_file, Deck, DeckDifference, DeckError, DeckStats};
pub use hand::{HandTally, HAND_SIZE};
pub use insights::{Insight, InsightGenerator};
pub use pipeline::{CancelToken, DeckInput, SimMessage, SimulationJob, SimulationReport, DEFAULT_TRIALS, POLL_INTERVAL};
pub use results::{CategoryComposition, RunResult, TypeComposition};
pub use sampler::{HandSampler, SimulationError};
