#[cfg(test)]
mod tests {
    use safe_bite::diet::evaluate_diet;
    use safe_bite::evaluation::Status;
    use safe_bite::hotlist::evaluate_hotlist;
    use safe_bite::rules::{RuleSet, Severity};
    use safe_bite::verdict::{evaluate_label, ScanProfile};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CUSTOM_RULES: &str = r#"{
        "diets": {
            "lowFodmap": { "hardBlocks": ["garlic", "onion"], "uncertain": ["natural flavors"] }
        },
        "allergies": {
            "mustard": ["mustard", "mustard seed"]
        },
        "hotlist": [
            {
                "name": "Titanium Dioxide",
                "keywords": ["titanium dioxide", "e171"],
                "severity": "medium",
                "reason": "Titanium dioxide is under review as a food colour."
            }
        ]
    }"#;

    fn write_rules(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).expect("Failed to write rules");
        file
    }

    #[test]
    fn test_load_rules_from_file() {
        let file = write_rules(CUSTOM_RULES);
        let rules = RuleSet::load(file.path()).unwrap();

        assert_eq!(rules.diets().count(), 1);
        assert_eq!(rules.allergy_names().collect::<Vec<_>>(), ["mustard"]);
        assert_eq!(rules.hotlist()[0].severity, Severity::Medium);

        let verdict = evaluate_label(
            "Onion powder, E-171, mustard seed",
            &ScanProfile::new(vec!["Mustard".to_string()], None),
            &rules,
        );
        assert_eq!(verdict.diet_checks["lowFodmap"].hits(), ["onion"]);
        assert_eq!(verdict.allergy_check.hits()[0].allergy, "Mustard");
        assert_eq!(verdict.hotlist_check.hits()[0].matched_keyword, "e171");
    }

    #[test]
    fn test_builtin_diets_do_not_exist_in_custom_tables() {
        let file = write_rules(CUSTOM_RULES);
        let rules = RuleSet::load(file.path()).unwrap();
        assert_eq!(evaluate_diet(&["milk"], &rules, "vegan").status(), Status::Unknown);
        assert_eq!(evaluate_diet(&["leek"], &rules, "low_fodmap").status(), Status::Pass);
    }

    #[test]
    fn test_builtin_tables_round_trip_through_json() {
        let builtin = RuleSet::builtin();
        let file = write_rules(&serde_json::to_string_pretty(&*builtin).unwrap());
        let loaded = RuleSet::load(file.path()).unwrap();
        assert_eq!(&loaded, &*builtin);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RuleSet::load(dir.path().join("rules.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read rule tables"));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let file = write_rules("{ \"diets\": ");
        let err = RuleSet::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("not valid JSON"));
    }

    #[test]
    fn test_unmatchable_keyword_is_rejected() {
        let file = write_rules(&CUSTOM_RULES.replace("\"garlic\"", "\"gelatin (pork)\""));
        let err = RuleSet::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("gelatin (pork)"));
    }

    #[test]
    fn test_overlapping_diet_keyword_is_rejected() {
        let file = write_rules(&CUSTOM_RULES.replace("\"natural flavors\"", "\"onion\""));
        assert!(RuleSet::load(file.path()).is_err());
    }

    #[test]
    fn test_builtin_hotlist_is_grouped_by_severity() {
        let rules = RuleSet::builtin();
        let check = evaluate_hotlist(&["bpa", "lead acetate"], &rules);
        let severities: Vec<Severity> = check.hits().iter().map(|h| h.severity).collect();
        assert_eq!(severities, [Severity::High, Severity::Medium]);
    }
}
