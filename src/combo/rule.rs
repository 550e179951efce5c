use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Distinct card names present in a hand
pub type HandSet<'a> = HashSet<&'a str>;

#[derive(Error, Debug)]
pub enum ComboError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Combo '{0}' has no must-have cards and no need-one groups")]
    EmptyRule(String),
    #[error("Combo '{combo}' failed to evaluate: {reason}")]
    EvaluationFailed { combo: String, reason: String },
}

/// Structured combo definition: every `must_have` card, plus at least one
/// card from each of the `need_one_groups`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComboRule {
    #[serde(default)]
    pub must_have: BTreeSet<String>,
    #[serde(default)]
    pub need_one_groups: Vec<BTreeSet<String>>,
}

impl ComboRule {
    /// Build a rule, dropping empty groups. A rule that ends up with no
    /// requirements at all is rejected.
    pub fn new<M, G, S>(name: &str, must_have: M, need_one_groups: G) -> Result<Self, ComboError>
    where
        M: IntoIterator<Item = S>,
        G: IntoIterator,
        G::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ComboRule {
            must_have: must_have.into_iter().map(Into::into).collect(),
            need_one_groups: need_one_groups
                .into_iter()
                .map(|g| g.into_iter().map(Into::into).collect())
                .collect(),
        }
        .validated(name)
    }

    /// Normalise a deserialized rule the same way `new` does
    pub fn validated(mut self, name: &str) -> Result<Self, ComboError> {
        self.need_one_groups.retain(|g| !g.is_empty());
        if self.must_have.is_empty() && self.need_one_groups.is_empty() {
            return Err(ComboError::EmptyRule(name.to_string()));
        }
        Ok(self)
    }

    /// Every card the rule mentions
    pub fn cards(&self) -> BTreeSet<&str> {
        self.must_have
            .iter()
            .chain(self.need_one_groups.iter().flatten())
            .map(|s| s.as_str())
            .collect()
    }
}

/// True iff the hand holds every must-have card and intersects every group
pub fn evaluate(hand: &HandSet, rule: &ComboRule) -> bool {
    rule.must_have.iter().all(|card| hand.contains(card.as_str()))
        && rule
            .need_one_groups
            .iter()
            .all(|group| group.iter().any(|card| hand.contains(card.as_str())))
}

type PredicateFn = dyn Fn(&HandSet) -> Result<bool, ComboError> + Send + Sync;

/// Opaque named check over a hand
#[derive(Clone)]
pub struct Predicate(Arc<PredicateFn>);

impl Predicate {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&HandSet) -> Result<bool, ComboError> + Send + Sync + 'static,
    {
        Predicate(Arc::new(check))
    }

    /// Wrap an infallible check
    pub fn infallible<F>(check: F) -> Self
    where
        F: Fn(&HandSet) -> bool + Send + Sync + 'static,
    {
        Predicate::new(move |hand| Ok(check(hand)))
    }
}

/// A combo condition in either of its two accepted shapes
#[derive(Clone)]
pub enum Rule {
    Structured(ComboRule),
    Predicate(Predicate),
}

impl Rule {
    pub fn evaluate(&self, hand: &HandSet) -> Result<bool, ComboError> {
        match self {
            Rule::Structured(rule) => Ok(evaluate(hand, rule)),
            Rule::Predicate(Predicate(check)) => check(hand),
        }
    }

    pub fn as_structured(&self) -> Option<&ComboRule> {
        match self {
            Rule::Structured(rule) => Some(rule),
            Rule::Predicate(_) => None,
        }
    }
}

impl From<ComboRule> for Rule {
    fn from(rule: ComboRule) -> Self {
        Rule::Structured(rule)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Structured(rule) => f.debug_tuple("Structured").field(rule).finish(),
            Rule::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}
