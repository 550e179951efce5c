pub mod defaults;
pub mod rule;
pub mod ruleset;

pub use rule::{evaluate, ComboError, ComboRule, HandSet, Predicate, Rule};
pub use ruleset::{ComboRuleSet, InvolvementMap};
