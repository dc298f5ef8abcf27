//! # Diet Evaluator
//!
//! Scores a token sequence against one diet or every configured diet.
//! Hard blocks always take priority over uncertain keywords, and within a
//! tier every match is collected so failure reasons are exhaustive.

use log::{debug, trace};
use std::collections::BTreeMap;

use crate::evaluation::{DietCheck, EvaluationResult};
use crate::normalizer::contains_keyword;
use crate::rules::{DietRule, RuleSet};

pub const NO_CONFLICTS_REASON: &str = "No conflicting ingredients found";
pub const UNCERTAIN_REASON: &str = "Contains potentially incompatible ingredients";

/// Diet name -> verdict
pub type DietChecks = BTreeMap<String, DietCheck>;

/// Evaluate a single named diet
///
/// A name with no configured rules yields `unknown`, never an error.
///
/// # Examples
///
/// ```rust
/// use safe_bite::diet::evaluate_diet;
/// use safe_bite::rules::RuleSet;
///
/// let rules = RuleSet::builtin();
/// let check = evaluate_diet(&["milk", "sugar"], &rules, "vegan");
/// assert_eq!(check.reason(), "Contains milk");
/// ```
pub fn evaluate_diet<T: AsRef<str>>(tokens: &[T], rules: &RuleSet, diet: &str) -> DietCheck {
    match rules.diet(diet) {
        Some((name, rule)) => evaluate_rule(tokens, name, rule),
        None => {
            debug!("No rules configured for diet '{}'", diet);
            EvaluationResult::Unknown {
                reason: format!("No rules defined for diet: {diet}"),
            }
        }
    }
}

/// Evaluate every configured diet
pub fn evaluate_all_diets<T: AsRef<str>>(tokens: &[T], rules: &RuleSet) -> DietChecks {
    rules
        .diets()
        .map(|(name, rule)| (name.to_string(), evaluate_rule(tokens, name, rule)))
        .collect()
}

/// Evaluate one diet when named, otherwise all of them
///
/// A named diet is keyed by the caller's spelling, so an unknown name still
/// gets its `unknown` entry.
pub fn evaluate_diets<T: AsRef<str>>(tokens: &[T], rules: &RuleSet, diet: Option<&str>) -> DietChecks {
    match diet {
        Some(diet) => {
            let mut checks = DietChecks::new();
            checks.insert(diet.to_string(), evaluate_diet(tokens, rules, diet));
            checks
        }
        None => evaluate_all_diets(tokens, rules),
    }
}

fn evaluate_rule<T: AsRef<str>>(tokens: &[T], name: &str, rule: &DietRule) -> DietCheck {
    let hard_hits = matching(tokens, &rule.hard_blocks);
    if !hard_hits.is_empty() {
        debug!("Diet '{}' blocked by {:?}", name, hard_hits);
        return EvaluationResult::Fail {
            reason: format!("Contains {}", hard_hits.join(", ")),
            hits: hard_hits,
        };
    }

    let uncertain_hits = matching(tokens, &rule.uncertain);
    if !uncertain_hits.is_empty() {
        debug!("Diet '{}' uncertain because of {:?}", name, uncertain_hits);
        return EvaluationResult::Uncertain {
            reason: UNCERTAIN_REASON.to_string(),
            hits: uncertain_hits,
        };
    }

    trace!("Diet '{}' passed", name);
    EvaluationResult::pass(NO_CONFLICTS_REASON)
}

fn matching<T: AsRef<str>>(tokens: &[T], keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|keyword| contains_keyword(tokens, keyword))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::Status;

    fn rules() -> std::sync::Arc<RuleSet> {
        RuleSet::builtin()
    }

    #[test]
    fn test_vegan_fails_on_milk() {
        let check = evaluate_diet(&["milk", "sugar"], &rules(), "vegan");
        assert_eq!(
            check,
            EvaluationResult::Fail {
                reason: "Contains milk".to_string(),
                hits: vec!["milk".to_string()],
            }
        );
    }

    #[test]
    fn test_all_hard_hits_are_collected() {
        let check = evaluate_diet(&["whey powder", "egg yolk", "honey"], &rules(), "vegan");
        assert_eq!(check.status(), Status::Fail);
        assert_eq!(check.hits(), ["whey", "egg", "honey"]);
        assert_eq!(check.reason(), "Contains whey, egg, honey");
    }

    #[test]
    fn test_uncertain_lists_every_match() {
        let check = evaluate_diet(&["soy lecithin", "e471", "water"], &rules(), "vegan");
        assert_eq!(check.status(), Status::Uncertain);
        assert_eq!(check.hits(), ["lecithin", "e471"]);
        assert_eq!(check.reason(), UNCERTAIN_REASON);
    }

    #[test]
    fn test_hard_block_beats_uncertain() {
        let check = evaluate_diet(&["soy lecithin", "gelatin"], &rules(), "vegan");
        assert_eq!(check.status(), Status::Fail);
        assert_eq!(check.hits(), ["gelatin"]);
    }

    #[test]
    fn test_empty_tokens_pass() {
        let check = evaluate_diet::<&str>(&[], &rules(), "vegan");
        assert_eq!(check, EvaluationResult::pass(NO_CONFLICTS_REASON));
    }

    #[test]
    fn test_unknown_diet() {
        let check = evaluate_diet(&["milk"], &rules(), "carnivore");
        assert_eq!(
            check,
            EvaluationResult::Unknown {
                reason: "No rules defined for diet: carnivore".to_string(),
            }
        );
    }

    #[test]
    fn test_diet_name_is_tolerant() {
        let check = evaluate_diet(&["wheat flour"], &rules(), "Gluten-Free");
        assert_eq!(check.status(), Status::Fail);
    }

    #[test]
    fn test_all_diets_one_entry_each() {
        let checks = evaluate_all_diets(&["chicken broth", "rice"], &rules());
        assert_eq!(checks.len(), rules().diets().count());
        assert_eq!(checks["vegan"].status(), Status::Fail);
        assert_eq!(checks["vegetarian"].status(), Status::Fail);
        assert_eq!(checks["pescatarian"].status(), Status::Fail);
        assert_eq!(checks["keto"].status(), Status::Fail);
        assert_eq!(checks["glutenFree"].status(), Status::Pass);
        assert_eq!(checks["halal"].status(), Status::Pass);
    }

    #[test]
    fn test_evaluate_diets_named_or_all() {
        let single = evaluate_diets(&["sugar"], &rules(), Some("carnivore"));
        assert_eq!(single.len(), 1);
        assert_eq!(single["carnivore"].status(), Status::Unknown);

        let all = evaluate_diets(&["sugar"], &rules(), None);
        assert_eq!(all.len(), 8);
        assert_eq!(all["keto"].status(), Status::Fail);
    }
}
