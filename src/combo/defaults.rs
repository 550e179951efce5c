//! Built-in combos for the default card pool.
//!
//! The simulation uses the predicate forms; the structured forms describe the
//! same conditions for listing and as a starting point for user overrides.

use crate::combo::rule::{ComboRule, HandSet, Predicate, Rule};
use std::collections::{BTreeMap, BTreeSet};

pub const FURNITURE_BACK_JACK: &str = "Furniture + Back Jack";
pub const ARIAS_DISRUPTION: &str = "Arias + Disruption Trap";
pub const ROLLBACK: &str = "Rollback Combo";
pub const ACCESS_FURNITURE_BACK_JACK: &str = "Access to Furniture + Back Jack";
pub const FURNITURE: &str = "Furniture Combo";
pub const LADY: &str = "Lady Combo";

const FURNITURE_CARDS: [&str; 2] = ["Labrynth Stovie Torbie", "Labrynth Chandraglier"];
const WELCOME_CARDS: [&str; 2] = ["Welcome Labrynth", "Big Welcome Labrynth"];
const DISRUPTION_TRAPS: [&str; 3] = [
    "Trap Trick",
    "Destructive Daruma Karma Cannon",
    "Dimensional Barrier",
];

const BACK_JACK: &str = "Absolute King Back Jack";
const ARIAS: &str = "Arias the Labrynth Butler";
const ARIANNA: &str = "Arianna the Labrynth Servant";
const COOCLOCK: &str = "Labrynth Cooclock";
const LADY_LABRYNTH: &str = "Lady Labrynth of the Silver Castle";
const DOMINUS: &str = "Dominus Impulse";
const TRANSACTION_ROLLBACK: &str = "Transaction Rollback";

fn any_of(hand: &HandSet, cards: &[&str]) -> bool {
    cards.iter().any(|c| hand.contains(c))
}

/// Default combos as predicates over the hand
pub fn default_rules() -> BTreeMap<String, Rule> {
    let rules: [(&str, Predicate); 6] = [
        (
            FURNITURE_BACK_JACK,
            Predicate::infallible(|h| any_of(h, &FURNITURE_CARDS) && h.contains(BACK_JACK)),
        ),
        (
            ARIAS_DISRUPTION,
            Predicate::infallible(|h| h.contains(ARIAS) && any_of(h, &DISRUPTION_TRAPS)),
        ),
        (
            ROLLBACK,
            Predicate::infallible(|h| {
                h.contains(DOMINUS) && h.contains(TRANSACTION_ROLLBACK) && any_of(h, &FURNITURE_CARDS)
            }),
        ),
        (
            ACCESS_FURNITURE_BACK_JACK,
            Predicate::infallible(|h| {
                h.contains(ARIAS)
                    && (h.contains(ARIANNA) || any_of(h, &WELCOME_CARDS))
                    && h.contains(BACK_JACK)
            }),
        ),
        (
            FURNITURE,
            Predicate::infallible(|h| any_of(h, &FURNITURE_CARDS) && h.contains(COOCLOCK)),
        ),
        (
            LADY,
            Predicate::infallible(|h| {
                h.contains(LADY_LABRYNTH) && h.contains(ARIAS) && any_of(h, &WELCOME_CARDS)
            }),
        ),
    ];
    rules
        .into_iter()
        .map(|(name, predicate)| (name.to_string(), Rule::Predicate(predicate)))
        .collect()
}

fn structured(must_have: &[&str], need_one: &[&str]) -> ComboRule {
    ComboRule {
        must_have: must_have.iter().map(|s| s.to_string()).collect(),
        need_one_groups: vec![need_one.iter().map(|s| s.to_string()).collect()],
    }
}

/// Default combos in the structured must-have / need-one form
pub fn default_definitions() -> BTreeMap<String, ComboRule> {
    let access_group = [ARIANNA, WELCOME_CARDS[0], WELCOME_CARDS[1]];
    [
        (FURNITURE_BACK_JACK, structured(&[BACK_JACK], &FURNITURE_CARDS)),
        (ARIAS_DISRUPTION, structured(&[ARIAS], &DISRUPTION_TRAPS)),
        (ROLLBACK, structured(&[DOMINUS, TRANSACTION_ROLLBACK], &FURNITURE_CARDS)),
        (ACCESS_FURNITURE_BACK_JACK, structured(&[ARIAS, BACK_JACK], &access_group)),
        (FURNITURE, structured(&[COOCLOCK], &FURNITURE_CARDS)),
        (LADY, structured(&[LADY_LABRYNTH, ARIAS], &WELCOME_CARDS)),
    ]
    .into_iter()
    .map(|(name, rule)| (name.to_string(), rule))
    .collect()
}

/// Cards whose copy counts drive each default combo; used for recommendations
pub fn default_involvement() -> BTreeMap<String, BTreeSet<String>> {
    default_definitions()
        .into_iter()
        .map(|(name, rule)| {
            let cards: BTreeSet<String> = rule.cards().into_iter().map(str::to_string).collect();
            (name, cards)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardCatalog;
    use crate::combo::rule::evaluate;
    use crate::rng::GameRng;

    #[test]
    fn test_six_defaults_in_every_form() {
        assert_eq!(default_rules().len(), 6);
        assert_eq!(default_definitions().len(), 6);
        assert_eq!(default_involvement().len(), 6);
    }

    #[test]
    fn test_predicates_agree_with_structured_definitions() {
        let catalog = CardCatalog::builtin();
        let predicates = default_rules();
        let definitions = default_definitions();
        let mut rng = GameRng::new(Some(31337));
        let mut pool: Vec<&str> = catalog.card_names();

        for _ in 0..5000 {
            let hand: HandSet = rng.shuffle_prefix(&mut pool, 5).iter().copied().collect();
            for (name, rule) in &predicates {
                let by_predicate = rule.evaluate(&hand).expect("default predicates are infallible");
                let by_definition = evaluate(&hand, &definitions[name]);
                assert_eq!(by_predicate, by_definition, "{} disagrees on {:?}", name, hand);
            }
        }
    }

    #[test]
    fn test_involvement_uses_catalog_cards() {
        let catalog = CardCatalog::builtin();
        for (combo, cards) in default_involvement() {
            for card in cards {
                assert!(catalog.contains(&card), "{} references unknown {}", combo, card);
            }
        }
        let involvement = default_involvement();
        let lady = &involvement[LADY];
        assert!(lady.contains(LADY_LABRYNTH));
        assert!(lady.contains("Big Welcome Labrynth"));
    }

    #[test]
    fn test_lady_combo() {
        let rules = default_rules();
        let lady = &rules[LADY];
        let hit: HandSet = [LADY_LABRYNTH, ARIAS, "Welcome Labrynth", "Trap Trick", "Called by the Grave"]
            .into_iter()
            .collect();
        let miss: HandSet = [LADY_LABRYNTH, ARIAS, "Trap Trick"].into_iter().collect();
        assert!(lady.evaluate(&hit).expect("infallible"));
        assert!(!lady.evaluate(&miss).expect("infallible"));
    }
}
