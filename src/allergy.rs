//! # Allergy Evaluator
//!
//! Checks a token sequence against the user's allergies. One hit per allergy
//! is enough to prove presence, so trigger scanning stops at the first match
//! for each allergy and moves on to the next.

use log::{debug, warn};

use crate::evaluation::{AllergyCheck, AllergyHit, EvaluationResult};
use crate::normalizer::contains_keyword;
use crate::rules::RuleSet;

pub const NO_ALLERGENS_REASON: &str = "No allergen ingredients found";

/// Evaluate the requested allergies
///
/// Allergy names missing from the rule tables are skipped silently; use
/// [`unknown_allergies`] to surface them to the user.
///
/// # Examples
///
/// ```rust
/// use safe_bite::allergy::evaluate_allergies;
/// use safe_bite::rules::RuleSet;
///
/// let rules = RuleSet::builtin();
/// let check = evaluate_allergies(&["whey protein", "sugar"], &rules, &["milk"]);
/// assert_eq!(check.hits()[0].ingredient, "whey");
/// ```
pub fn evaluate_allergies<T, A>(tokens: &[T], rules: &RuleSet, allergies: &[A]) -> AllergyCheck
where
    T: AsRef<str>,
    A: AsRef<str>,
{
    let mut hits = Vec::new();

    for allergy in allergies.iter().map(AsRef::as_ref) {
        let Some(triggers) = rules.allergy_triggers(allergy) else {
            continue;
        };

        if let Some(trigger) = triggers.iter().find(|t| contains_keyword(tokens, t)) {
            debug!("Allergy '{}' triggered by '{}'", allergy, trigger);
            hits.push(AllergyHit {
                allergy: allergy.to_string(),
                ingredient: trigger.clone(),
            });
        }
    }

    if hits.is_empty() {
        return EvaluationResult::pass(NO_ALLERGENS_REASON);
    }

    let names: Vec<&str> = hits.iter().map(|hit| hit.allergy.as_str()).collect();
    EvaluationResult::Fail {
        reason: format!("Contains allergens: {}", names.join(", ")),
        hits,
    }
}

/// Requested allergy names that have no rule entry
pub fn unknown_allergies<'a, A: AsRef<str>>(rules: &RuleSet, allergies: &'a [A]) -> Vec<&'a str> {
    let unknown: Vec<&str> = allergies
        .iter()
        .map(AsRef::as_ref)
        .filter(|allergy| rules.allergy_triggers(allergy).is_none())
        .collect();
    if !unknown.is_empty() {
        warn!("Ignoring unknown allergy names: {:?}", unknown);
    }
    unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::Status;

    #[test]
    fn test_whey_proves_milk() {
        let rules = RuleSet::builtin();
        let check = evaluate_allergies(&["whey protein", "sugar"], &rules, &["milk"]);
        assert_eq!(
            check,
            EvaluationResult::Fail {
                reason: "Contains allergens: milk".to_string(),
                hits: vec![AllergyHit {
                    allergy: "milk".to_string(),
                    ingredient: "whey".to_string(),
                }],
            }
        );
    }

    #[test]
    fn test_one_hit_per_allergy() {
        let rules = RuleSet::builtin();
        let tokens = ["milk", "butter", "cheese", "peanut butter"];
        let check = evaluate_allergies(&tokens, &rules, &["milk", "peanut"]);
        assert_eq!(check.hits().len(), 2);
        assert_eq!(check.hits()[0].ingredient, "milk");
        assert_eq!(check.hits()[1].allergy, "peanut");
        assert_eq!(check.hits()[1].ingredient, "peanut");
    }

    #[test]
    fn test_first_trigger_in_table_order_wins() {
        let rules = RuleSet::builtin();
        let check = evaluate_allergies(&["soy lecithin"], &rules, &["soy"]);
        assert_eq!(check.hits()[0].ingredient, "soy");
    }

    #[test]
    fn test_pass_when_nothing_matches() {
        let rules = RuleSet::builtin();
        let check = evaluate_allergies(&["water", "salt"], &rules, &["milk", "egg", "sesame"]);
        assert_eq!(check, EvaluationResult::pass(NO_ALLERGENS_REASON));
    }

    #[test]
    fn test_unknown_allergy_is_skipped() {
        let rules = RuleSet::builtin();
        let check = evaluate_allergies(&["kiwi", "milk"], &rules, &["kiwi"]);
        assert_eq!(check.status(), Status::Pass);
        assert_eq!(unknown_allergies(&rules, &["kiwi", "milk", "Tree Nut"]), ["kiwi"]);
    }

    #[test]
    fn test_no_allergies_requested() {
        let rules = RuleSet::builtin();
        let check = evaluate_allergies::<&str, &str>(&["milk"], &rules, &[]);
        assert!(check.is_pass());
    }

    #[test]
    fn test_allergy_name_spelling_is_echoed() {
        let rules = RuleSet::builtin();
        let check = evaluate_allergies(&["roasted cashews"], &rules, &["Tree Nut"]);
        assert_eq!(check.hits()[0].allergy, "Tree Nut");
        assert_eq!(check.hits()[0].ingredient, "cashew");
    }
}
