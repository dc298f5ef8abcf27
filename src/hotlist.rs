//! # Hotlist Evaluator
//!
//! Checks a token sequence against the restricted-chemical hotlist. Each
//! chemical reports at most one hit (its first matching keyword), and hits
//! keep rule-table declaration order.

use log::debug;

use crate::evaluation::{EvaluationResult, HotlistCheck, HotlistHit};
use crate::normalizer::contains_keyword;
use crate::rules::RuleSet;

pub const NO_HOTLIST_REASON: &str = "No hotlist chemicals found";

/// Evaluate the hotlist
///
/// # Examples
///
/// ```rust
/// use safe_bite::hotlist::evaluate_hotlist;
/// use safe_bite::rules::RuleSet;
///
/// let rules = RuleSet::builtin();
/// assert!(evaluate_hotlist(&["water", "citric acid"], &rules).is_pass());
/// ```
pub fn evaluate_hotlist<T: AsRef<str>>(tokens: &[T], rules: &RuleSet) -> HotlistCheck {
    let hits: Vec<HotlistHit> = rules
        .hotlist()
        .iter()
        .filter_map(|rule| {
            rule.keywords
                .iter()
                .find(|keyword| contains_keyword(tokens, keyword))
                .map(|keyword| HotlistHit {
                    chemical: rule.name.clone(),
                    severity: rule.severity,
                    matched_keyword: keyword.clone(),
                    reason: rule.reason.clone(),
                })
        })
        .collect();

    if hits.is_empty() {
        return EvaluationResult::pass(NO_HOTLIST_REASON);
    }

    debug!(
        "Hotlist matched {} chemicals: {:?}",
        hits.len(),
        hits.iter().map(|h| h.chemical.as_str()).collect::<Vec<_>>()
    );

    let count = hits.len();
    EvaluationResult::Fail {
        reason: format!(
            "Contains {count} hotlist chemical{}",
            if count == 1 { "" } else { "s" }
        ),
        hits,
    }
}

/// Hits reordered for presentation: every `high` before any `medium`
///
/// The sort is stable, so declaration order is kept within a severity.
pub fn by_severity(hits: &[HotlistHit]) -> Vec<&HotlistHit> {
    let mut ordered: Vec<&HotlistHit> = hits.iter().collect();
    ordered.sort_by_key(|hit| hit.severity);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{HotlistRule, Severity};
    use std::collections::BTreeMap;

    #[test]
    fn test_clean_ingredients_pass() {
        let rules = RuleSet::builtin();
        let check = evaluate_hotlist(&["water", "citric acid"], &rules);
        assert_eq!(check, EvaluationResult::pass(NO_HOTLIST_REASON));
    }

    #[test]
    fn test_one_hit_per_chemical_with_metadata() {
        let rules = RuleSet::builtin();
        let check = evaluate_hotlist(&["sodium benzoate", "benzoic acid"], &rules);
        assert!(check.is_fail());
        assert_eq!(check.hits().len(), 1);

        let hit = &check.hits()[0];
        assert_eq!(hit.chemical, "Sodium Benzoate");
        assert_eq!(hit.severity, Severity::Medium);
        assert_eq!(hit.matched_keyword, "sodium benzoate");
        assert!(hit.reason.contains("benzene"));
        assert_eq!(check.reason(), "Contains 1 hotlist chemical");
    }

    #[test]
    fn test_hits_follow_declaration_order() {
        let rules = RuleSet::builtin();
        let check = evaluate_hotlist(&["tartrazine", "methylparaben", "bht"], &rules);
        let chemicals: Vec<&str> = check.hits().iter().map(|h| h.chemical.as_str()).collect();
        assert_eq!(
            chemicals,
            ["Parabens", "Butylated Hydroxytoluene (BHT)", "Artificial Colours (Azo Dyes)"]
        );
    }

    #[test]
    fn test_hyphenated_label_matches_spaced_keyword() {
        let rules = RuleSet::builtin();
        let tokens = crate::normalizer::normalize("Pork, Water, Sodium-Nitrite, Quaternium-15");
        let check = evaluate_hotlist(&tokens, &rules);
        let keywords: Vec<&str> = check.hits().iter().map(|h| h.matched_keyword.as_str()).collect();
        assert_eq!(keywords, ["quaternium 15", "sodium nitrite"]);
    }

    #[test]
    fn test_by_severity_puts_high_first() {
        let hotlist = vec![
            HotlistRule {
                name: "Dye".to_string(),
                keywords: vec!["red 40".to_string()],
                severity: Severity::Medium,
                reason: "Flagged.".to_string(),
            },
            HotlistRule {
                name: "Lead".to_string(),
                keywords: vec!["lead".to_string()],
                severity: Severity::High,
                reason: "Banned.".to_string(),
            },
            HotlistRule {
                name: "Triclosan".to_string(),
                keywords: vec!["triclosan".to_string()],
                severity: Severity::Medium,
                reason: "Flagged.".to_string(),
            },
        ];
        let rules = RuleSet::new(BTreeMap::new(), BTreeMap::new(), hotlist).unwrap();
        let check = evaluate_hotlist(&["triclosan", "lead acetate", "red 40"], &rules);

        let declared: Vec<&str> = check.hits().iter().map(|h| h.chemical.as_str()).collect();
        assert_eq!(declared, ["Dye", "Lead", "Triclosan"]);

        let ordered: Vec<&str> = by_severity(check.hits()).iter().map(|h| h.chemical.as_str()).collect();
        assert_eq!(ordered, ["Lead", "Dye", "Triclosan"]);
    }

    #[test]
    fn test_empty_tokens_pass() {
        let rules = RuleSet::builtin();
        assert!(evaluate_hotlist::<String>(&[], &rules).is_pass());
    }
}
