//! # Spoken Summary Module
//!
//! Builds the text a screen reader or text-to-speech engine reads after a
//! scan. Hotlist alerts always come right after the compatibility line, with
//! high-severity chemicals announced before medium ones.

use std::collections::HashMap;

use crate::evaluation::{HotlistHit, Status};
use crate::explainer::Explanations;
use crate::hotlist::by_severity;
use crate::rules::Severity;
use crate::verdict::ProductVerdict;

/// Render the spoken summary for one evaluated product
///
/// # Examples
///
/// ```rust
/// use safe_bite::rules::RuleSet;
/// use safe_bite::speech::product_summary;
/// use safe_bite::verdict::{evaluate_label, ScanProfile};
///
/// let rules = RuleSet::builtin();
/// let verdict = evaluate_label("water, sugar", &ScanProfile::default(), &rules);
/// let text = product_summary("Lemonade", &verdict, None);
/// assert!(text.starts_with("Product information for Lemonade. Good news!"));
/// ```
pub fn product_summary(
    name: &str,
    verdict: &ProductVerdict,
    explanations: Option<&Explanations>,
) -> String {
    let mut speech = format!("Product information for {name}. ");

    let issues = compatibility_issues(verdict);
    if issues.is_empty() {
        speech.push_str("Good news! This product is safe for your diet. ");
    } else {
        speech.push_str(&format!(
            "Warning! This product is not suitable for you. Issues: {}. ",
            issues.join(", ")
        ));
    }

    push_hotlist_alert(&mut speech, verdict.hotlist_check.hits());

    let allergy_hits = verdict.allergy_check.hits();
    if !allergy_hits.is_empty() {
        speech.push_str("Allergy alert: ");
        for hit in allergy_hits {
            speech.push_str(&format!("contains {} for your {} allergy. ", hit.ingredient, hit.allergy));
        }
    }

    push_ingredients(&mut speech, &verdict.ingredients, explanations);
    push_diets(&mut speech, verdict);

    speech.trim_end().to_string()
}

fn compatibility_issues(verdict: &ProductVerdict) -> Vec<String> {
    let mut issues: Vec<String> = verdict
        .diet_checks
        .iter()
        .filter(|(_, check)| check.is_fail())
        .map(|(diet, _)| format!("not {}", readable_name(diet)))
        .collect();

    issues.extend(
        verdict
            .allergy_check
            .hits()
            .iter()
            .map(|hit| format!("contains {}", hit.allergy)),
    );

    if verdict
        .hotlist_check
        .hits()
        .iter()
        .any(|hit| hit.severity == Severity::High)
    {
        issues.push("restricted chemicals".to_string());
    }
    issues
}

fn push_hotlist_alert(speech: &mut String, hits: &[HotlistHit]) {
    if hits.is_empty() {
        return;
    }
    speech.push_str("CRITICAL ALERT: This product contains chemicals on Canada's Hotlist. ");

    let ordered = by_severity(hits);
    for severity in [Severity::High, Severity::Medium] {
        let group: Vec<&&HotlistHit> = ordered.iter().filter(|hit| hit.severity == severity).collect();
        if group.is_empty() {
            continue;
        }

        let plural = if group.len() > 1 { "s" } else { "" };
        speech.push_str(&match severity {
            Severity::High => format!("{} banned or restricted chemical{plural} detected: ", group.len()),
            Severity::Medium => format!("{} chemical{plural} under review: ", group.len()),
        });
        for hit in group {
            speech.push_str(&format!("{}. {}. ", hit.chemical, hit.reason.trim_end_matches('.')));
        }
    }
}

fn push_ingredients(speech: &mut String, ingredients: &[String], explanations: Option<&Explanations>) {
    if ingredients.is_empty() {
        return;
    }
    speech.push_str("Ingredients: ");

    let explained: HashMap<String, &str> = explanations
        .into_iter()
        .flatten()
        .map(|(name, text)| (name.to_lowercase(), text.as_str()))
        .collect();

    if explained.is_empty() {
        speech.push_str(&format!("{}. ", ingredients.join(", ")));
        return;
    }

    for ingredient in ingredients {
        let line = match explained.get(&ingredient.to_lowercase()) {
            Some(text) => format!("{ingredient}: {}. ", text.trim_end_matches('.')),
            None => format!("{ingredient}. "),
        };
        speech.push_str(&line);
    }
}

fn push_diets(speech: &mut String, verdict: &ProductVerdict) {
    let diets_with = |status: Status| -> Vec<String> {
        verdict
            .diet_checks
            .iter()
            .filter(|(_, check)| check.status() == status)
            .map(|(diet, _)| readable_name(diet))
            .collect()
    };

    let lines = [
        (Status::Pass, "This product is suitable for"),
        (Status::Fail, "Not suitable for"),
        (Status::Uncertain, "Uncertain compatibility with"),
    ];
    for (status, label) in lines {
        let diets = diets_with(status);
        if !diets.is_empty() {
            speech.push_str(&format!("{label}: {}. ", diets.join(", ")));
        }
    }
}

/// `glutenFree` → `gluten free`
pub fn readable_name(name: &str) -> String {
    let mut readable = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_uppercase() {
            readable.push(' ');
        }
        readable.extend(c.to_lowercase());
    }
    readable.trim().to_string()
}
