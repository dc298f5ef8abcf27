//! # Combined Verdict
//!
//! Runs the normalizer and all three evaluator families for one label and
//! assembles the JSON-ready verdict handed back to the product-lookup caller.

use log::info;
use serde::{Deserialize, Serialize};

use crate::allergy::{evaluate_allergies, unknown_allergies};
use crate::diet::{evaluate_diets, DietChecks};
use crate::evaluation::{AllergyCheck, HotlistCheck};
use crate::hotlist::evaluate_hotlist;
use crate::normalizer::{normalize, IngredientTokens};
use crate::rules::RuleSet;

pub const EMPTY_LABEL_ADVISORY: &str =
    "No ingredient text could be read; checks found nothing to flag";

/// What the user wants checked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProfile {
    #[serde(default)]
    pub allergies: Vec<String>,
    /// One diet to check; `None` checks every configured diet
    #[serde(default)]
    pub diet: Option<String>,
}

impl ScanProfile {
    pub fn new(allergies: Vec<String>, diet: Option<String>) -> Self {
        Self { allergies, diet }
    }
}

/// Combined verdict for one ingredient label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVerdict {
    pub ingredients: IngredientTokens,
    pub diet_checks: DietChecks,
    pub allergy_check: AllergyCheck,
    pub hotlist_check: HotlistCheck,
    /// Caveats about the verdict itself, e.g. an unreadable label
    pub advisories: Vec<String>,
}

/// Normalize raw label text and evaluate it
///
/// # Examples
///
/// ```rust
/// use safe_bite::rules::RuleSet;
/// use safe_bite::verdict::{evaluate_label, ScanProfile};
///
/// let rules = RuleSet::builtin();
/// let profile = ScanProfile::new(vec!["milk".to_string()], Some("vegan".to_string()));
/// let verdict = evaluate_label("Ingredients: sugar, whey powder", &profile, &rules);
/// assert!(verdict.allergy_check.is_fail());
/// assert!(verdict.diet_checks["vegan"].is_fail());
/// ```
pub fn evaluate_label(raw: &str, profile: &ScanProfile, rules: &RuleSet) -> ProductVerdict {
    evaluate_tokens(normalize(raw), profile, rules)
}

/// Evaluate an already-normalized token sequence
pub fn evaluate_tokens(tokens: IngredientTokens, profile: &ScanProfile, rules: &RuleSet) -> ProductVerdict {
    let diet_checks = evaluate_diets(&tokens, rules, profile.diet.as_deref());
    let allergy_check = evaluate_allergies(&tokens, rules, &profile.allergies);
    let hotlist_check = evaluate_hotlist(&tokens, rules);

    let mut advisories = Vec::new();
    if tokens.is_empty() {
        advisories.push(EMPTY_LABEL_ADVISORY.to_string());
    }
    advisories.extend(
        unknown_allergies(rules, &profile.allergies)
            .into_iter()
            .map(|name| format!("Unknown allergy ignored: {name}")),
    );

    info!(
        "Evaluated {} tokens: {} diet checks, allergy {}, hotlist {}",
        tokens.len(),
        diet_checks.len(),
        allergy_check.status(),
        hotlist_check.status()
    );

    ProductVerdict {
        ingredients: tokens,
        diet_checks,
        allergy_check,
        hotlist_check,
        advisories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::Status;
    use serde_json::json;

    #[test]
    fn test_full_verdict_serialization() {
        let rules = RuleSet::builtin();
        let profile = ScanProfile::new(vec!["milk".to_string()], Some("vegan".to_string()));
        let verdict = evaluate_label("Milk chocolate (sugar), BHT", &profile, &rules);

        let value = serde_json::to_value(&verdict).unwrap();
        assert_eq!(value["ingredients"], json!(["milk chocolate", "bht"]));
        assert_eq!(value["dietChecks"]["vegan"]["status"], "fail");
        assert_eq!(
            value["allergyCheck"]["hits"],
            json!([{ "allergy": "milk", "ingredient": "milk" }])
        );
        assert_eq!(value["hotlistCheck"]["hits"][0]["severity"], "high");
        assert_eq!(value["hotlistCheck"]["hits"][0]["matchedKeyword"], "bht");
        assert_eq!(value["advisories"], json!([]));
    }

    #[test]
    fn test_empty_label_fails_open_with_advisory() {
        let rules = RuleSet::builtin();
        let profile = ScanProfile::new(vec!["peanut".to_string()], None);
        let verdict = evaluate_label("", &profile, &rules);

        assert!(verdict.diet_checks.values().all(|c| c.status() == Status::Pass));
        assert!(verdict.allergy_check.is_pass());
        assert!(verdict.hotlist_check.is_pass());
        assert_eq!(verdict.advisories, [EMPTY_LABEL_ADVISORY]);
    }

    #[test]
    fn test_unknown_allergy_is_reported_as_advisory() {
        let rules = RuleSet::builtin();
        let profile = ScanProfile::new(vec!["milkk".to_string()], None);
        let verdict = evaluate_label("milk", &profile, &rules);
        assert!(verdict.allergy_check.is_pass());
        assert_eq!(verdict.advisories, ["Unknown allergy ignored: milkk"]);
    }

    #[test]
    fn test_profile_defaults_from_json() {
        let profile: ScanProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile, ScanProfile::default());
    }
}
