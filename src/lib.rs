pub mod card;
pub mod combo;
pub mod report;
pub mod rng;
pub mod simulation;

#[cfg(test)]
mod integration_tests;
