use crate::combo::defaults;
use crate::combo::rule::{ComboError, ComboRule, HandSet, Rule};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Combo name to the cards whose copy counts matter for it
pub type InvolvementMap = BTreeMap<String, BTreeSet<String>>;

/// Named combo rules, iterated in name order
#[derive(Debug, Clone, Default)]
pub struct ComboRuleSet {
    rules: BTreeMap<String, Rule>,
}

impl ComboRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in combos
    pub fn with_defaults() -> Self {
        ComboRuleSet {
            rules: defaults::default_rules(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, rule: impl Into<Rule>) {
        self.rules.insert(name.into(), rule.into());
    }

    /// Merge another set over this one; entries of `overrides` win on name clashes
    pub fn merge(&mut self, overrides: ComboRuleSet) {
        for (name, rule) in overrides.rules {
            if self.rules.contains_key(&name) {
                log::info!("custom combo '{}' overrides the built-in definition", name);
            }
            self.rules.insert(name, rule);
        }
    }

    /// Load custom combos from a JSON file and merge them over this set
    pub fn load_overrides(&mut self, path: impl AsRef<Path>) -> Result<usize, ComboError> {
        let content = std::fs::read_to_string(path)?;
        let overrides = Self::from_json(&content)?;
        let count = overrides.len();
        self.merge(overrides);
        Ok(count)
    }

    /// Parse `{name: {must_have: [...], need_one_groups: [[...]]}}`.
    /// Entries of any other shape, or with no requirements, are skipped with a warning.
    pub fn from_json(content: &str) -> Result<Self, ComboError> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut set = ComboRuleSet::new();
        for (name, value) in raw {
            let rule = match serde_json::from_value::<ComboRule>(value) {
                Ok(rule) => rule,
                Err(e) => {
                    log::warn!("skipping combo '{}': unrecognised definition ({})", name, e);
                    continue;
                }
            };
            match rule.validated(&name) {
                Ok(rule) => set.insert(name, rule),
                Err(e) => log::warn!("skipping combo: {}", e),
            }
        }
        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names of every combo the hand satisfies. Fails as a whole if any
    /// rule fails to evaluate.
    pub fn satisfied<'a>(&'a self, hand: &HandSet) -> Result<Vec<&'a str>, ComboError> {
        let mut hits = Vec::new();
        for (name, rule) in &self.rules {
            if rule.evaluate(hand)? {
                hits.push(name.as_str());
            }
        }
        Ok(hits)
    }
}
