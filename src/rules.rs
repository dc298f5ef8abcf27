//! # Rule Tables Module
//!
//! Static rule data for the three evaluator families:
//!
//! - **Diets**: per diet, hard-block keywords and uncertain keywords
//! - **Allergies**: per allergen family, an exhaustive trigger synonym set
//! - **Hotlist**: restricted chemicals with severity and a plain-language reason
//!
//! Tables are immutable after load and shared as `Arc<RuleSet>`. The built-in
//! tables can be replaced by a JSON file of the same shape.

use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::normalizer::normalize;

/// Characters the normalizer never leaves in a token; a keyword containing
/// one of them could never match.
const UNMATCHABLE_CHARS: [char; 9] = ['(', ')', '-', ',', ';', '/', '*', '†', '‡'];

/// Keyword lists for one diet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietRule {
    /// Any match unconditionally disqualifies the diet
    pub hard_blocks: Vec<String>,
    /// Matches that might violate the diet depending on sourcing
    pub uncertain: Vec<String>,
}

/// Hotlist severity tier
///
/// Ordering puts `High` before `Medium`, which is the order summaries must use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Banned or restricted
    High,
    /// Flagged for review
    Medium,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
        }
    }
}

/// One restricted chemical (or chemical family) on the hotlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotlistRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub severity: Severity,
    pub reason: String,
}

/// The complete, validated rule configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    diets: BTreeMap<String, DietRule>,
    allergies: BTreeMap<String, Vec<String>>,
    hotlist: Vec<HotlistRule>,
}

/// Lookup key for diet and allergy names: lowercase alphanumerics only
///
/// `"Tree Nut"`, `"tree_nut"` and `"treeNut"` all resolve to the same entry.
pub fn lookup_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl RuleSet {
    /// Build and validate a rule set from its three tables
    pub fn new(
        diets: BTreeMap<String, DietRule>,
        allergies: BTreeMap<String, Vec<String>>,
        hotlist: Vec<HotlistRule>,
    ) -> Result<Self> {
        let rules = Self {
            diets,
            allergies,
            hotlist,
        };
        rules.validate()?;
        Ok(rules)
    }

    /// The process-wide built-in tables
    pub fn builtin() -> Arc<RuleSet> {
        Arc::clone(&BUILTIN_RULES)
    }

    /// Parse and validate tables from JSON
    ///
    /// The shape is `{ "diets": { name: { "hardBlocks": [..], "uncertain": [..] } },
    /// "allergies": { name: [..] }, "hotlist": [ { "name", "keywords", "severity", "reason" } ] }`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rules: RuleSet = serde_json::from_str(json).context("Rule tables are not valid JSON")?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load tables from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule tables from {}", path.display()))?;
        let rules = Self::from_json_str(&content)
            .with_context(|| format!("Invalid rule tables in {}", path.display()))?;
        info!(
            "Loaded rule tables from {}: {} diets, {} allergies, {} hotlist chemicals",
            path.display(),
            rules.diets.len(),
            rules.allergies.len(),
            rules.hotlist.len()
        );
        Ok(rules)
    }

    /// Check the table invariants
    ///
    /// Keywords must be non-empty, lowercase, trimmed and already in the form
    /// the normalizer produces. A diet may not list a keyword as both hard block
    /// and uncertain, and every hotlist rule needs at least one keyword.
    pub fn validate(&self) -> Result<()> {
        let mut diet_keys = HashSet::new();
        for (diet, rule) in &self.diets {
            if !diet_keys.insert(lookup_key(diet)) {
                bail!("Diet '{diet}' collides with another diet name");
            }
            for keyword in rule.hard_blocks.iter().chain(&rule.uncertain) {
                check_keyword(keyword).with_context(|| format!("Diet '{diet}'"))?;
            }
            if let Some(both) = rule.hard_blocks.iter().find(|k| rule.uncertain.contains(k)) {
                bail!("Diet '{diet}' lists '{both}' as both hard block and uncertain");
            }
        }

        let mut allergy_keys = HashSet::new();
        for (allergy, triggers) in &self.allergies {
            if !allergy_keys.insert(lookup_key(allergy)) {
                bail!("Allergy '{allergy}' collides with another allergy name");
            }
            if triggers.is_empty() {
                bail!("Allergy '{allergy}' has no trigger keywords");
            }
            for trigger in triggers {
                check_keyword(trigger).with_context(|| format!("Allergy '{allergy}'"))?;
            }
        }

        for rule in &self.hotlist {
            if rule.keywords.is_empty() {
                bail!("Hotlist chemical '{}' has no keywords", rule.name);
            }
            for keyword in &rule.keywords {
                check_keyword(keyword).with_context(|| format!("Hotlist chemical '{}'", rule.name))?;
            }
        }

        debug!(
            "Validated rule tables: {} diets, {} allergies, {} hotlist chemicals",
            self.diets.len(),
            self.allergies.len(),
            self.hotlist.len()
        );
        Ok(())
    }

    /// Find a diet by name, returning its configured name and rule
    pub fn diet(&self, name: &str) -> Option<(&str, &DietRule)> {
        let key = lookup_key(name);
        self.diets
            .iter()
            .find(|(diet, _)| lookup_key(diet) == key)
            .map(|(diet, rule)| (diet.as_str(), rule))
    }

    /// Every configured diet, in name order
    pub fn diets(&self) -> impl Iterator<Item = (&str, &DietRule)> {
        self.diets.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Find an allergy's trigger keywords by name
    pub fn allergy_triggers(&self, name: &str) -> Option<&[String]> {
        let key = lookup_key(name);
        self.allergies
            .iter()
            .find(|(allergy, _)| lookup_key(allergy) == key)
            .map(|(_, triggers)| triggers.as_slice())
    }

    pub fn allergy_names(&self) -> impl Iterator<Item = &str> {
        self.allergies.keys().map(String::as_str)
    }

    /// Hotlist rules in declaration order
    pub fn hotlist(&self) -> &[HotlistRule] {
        &self.hotlist
    }
}

fn check_keyword(keyword: &str) -> Result<()> {
    if keyword.trim().is_empty() {
        bail!("empty keyword");
    }
    if keyword != keyword.trim() || keyword.contains("  ") {
        bail!("keyword '{keyword}' has stray whitespace");
    }
    if keyword != keyword.to_lowercase() {
        bail!("keyword '{keyword}' is not lowercase");
    }
    if let Some(c) = keyword.chars().find(|c| UNMATCHABLE_CHARS.contains(c)) {
        bail!("keyword '{keyword}' contains '{c}', which never survives normalization");
    }
    let normalized = normalize(keyword).joined();
    if normalized != keyword {
        bail!("keyword '{keyword}' normalizes to '{normalized}' and would never match");
    }
    Ok(())
}

// ─── Built-in tables ────────────────────────────────────────────────────────

type DietTable = &'static [(&'static str, &'static [&'static str], &'static [&'static str])];
type AllergyTable = &'static [(&'static str, &'static [&'static str])];
type HotlistTable = &'static [(&'static str, &'static [&'static str], Severity, &'static str)];

const DIETS: DietTable = &[
    (
        "vegan",
        &[
            "milk", "cheese", "butter", "cream", "whey", "casein", "lactose", "yogurt", "rennet",
            "lipase", "egg", "honey", "gelatin", "fish", "meat", "chicken", "beef", "pork",
        ],
        &["natural flavors", "mono and diglycerides", "enzymes", "lecithin", "e471", "e322"],
    ),
    (
        "vegetarian",
        &["meat", "chicken", "beef", "pork", "fish", "shellfish", "gelatin", "lard", "anchovy"],
        &["rennet", "enzymes", "natural flavors", "broth", "stock"],
    ),
    (
        "pescatarian",
        &["beef", "pork", "chicken", "lamb", "turkey", "gelatin", "lard"],
        &["broth", "stock", "natural flavors"],
    ),
    (
        "keto",
        &[
            "sugar", "corn syrup", "high fructose corn syrup", "rice", "wheat", "flour", "potato",
            "bread", "pasta",
        ],
        &["maltodextrin", "modified starch", "dextrose", "fructose", "natural sweeteners"],
    ),
    (
        "halal",
        &["pork", "bacon", "ham", "lard", "pork gelatin", "alcohol", "wine", "beer"],
        &["enzymes", "gelatin", "natural flavors", "emulsifiers", "shortening"],
    ),
    (
        "paleo",
        &[
            "grains", "wheat", "rice", "corn", "legumes", "soy", "peanuts", "dairy",
            "refined sugar",
        ],
        &["honey", "maple syrup", "natural sweeteners", "processed oils"],
    ),
    (
        "kosher",
        &["pork", "shellfish", "shrimp", "crab", "lobster", "mixing meat and dairy"],
        &["enzymes", "gelatin", "rennet", "natural flavors", "emulsifiers"],
    ),
    (
        "glutenFree",
        &["wheat", "barley", "rye", "malt", "spelt", "triticale"],
        &["oats", "brewer's yeast", "modified starch"],
    ),
];

const ALLERGIES: AllergyTable = &[
    (
        "milk",
        &["milk", "butter", "cheese", "cream", "casein", "whey", "lactose", "milk powder"],
    ),
    ("egg", &["egg", "egg white", "egg yolk", "albumin", "ovalbumin"]),
    ("peanut", &["peanut", "groundnut", "arachis"]),
    (
        "treeNut",
        &[
            "almond", "cashew", "walnut", "hazelnut", "pecan", "pistachio", "macadamia",
            "brazil nut",
        ],
    ),
    ("soy", &["soy", "soya", "soybean", "lecithin"]),
    ("gluten", &["wheat", "barley", "rye", "malt", "spelt"]),
    ("sesame", &["sesame", "tahini"]),
    ("shellfish", &["shrimp", "prawn", "crab", "lobster", "shellfish"]),
];

const HOTLIST: HotlistTable = &[
    // Banned / restricted
    (
        "Parabens",
        &[
            "paraben", "methylparaben", "ethylparaben", "propylparaben", "butylparaben",
            "isopropylparaben", "isobutylparaben",
        ],
        Severity::High,
        "Parabens are preservatives that have been restricted in Canada due to concerns about endocrine disruption.",
    ),
    (
        "Formaldehyde & Releasers",
        &[
            "formaldehyde", "dmdm hydantoin", "imidazolidinyl urea", "quaternium 15",
            "sodium hydroxymethylglycinate", "2 bromo 2 nitropropane", "bronopol",
        ],
        Severity::High,
        "Formaldehyde and its releasing agents are known carcinogens and are banned or heavily restricted in Canadian cosmetics.",
    ),
    (
        "Phthalates",
        &[
            "phthalate", "diethylhexyl phthalate", "dehp", "dibutyl phthalate", "dbp",
            "benzyl butyl phthalate", "bbp", "diisononyl phthalate", "dinp",
            "diisodecyl phthalate", "didp",
        ],
        Severity::High,
        "Phthalates are plasticisers linked to hormonal disruption. Several are prohibited under Canada's Chemicals Management Plan.",
    ),
    (
        "Mercury & Compounds",
        &["mercury", "mercuric", "thimerosal", "thiomersal", "phenylmercuric"],
        Severity::High,
        "Mercury compounds are toxic and banned in Canadian food and cosmetic products.",
    ),
    (
        "Lead",
        &["lead", "lead acetate", "lead nitrate"],
        Severity::High,
        "Lead is a potent neurotoxin. Health Canada prohibits it in consumer products.",
    ),
    (
        "Arsenic",
        &["arsenic", "arsenic trioxide", "sodium arsenite"],
        Severity::High,
        "Arsenic is a known carcinogen and is banned in Canadian consumer products.",
    ),
    (
        "Cadmium",
        &["cadmium", "cadmium chloride", "cadmium sulfate"],
        Severity::High,
        "Cadmium is a toxic heavy metal restricted under Canada's CEPA regulations.",
    ),
    (
        "Polycyclic Aromatic Hydrocarbons (PAHs)",
        &["polycyclic aromatic", "pah", "benzo[a]pyrene", "naphthalene"],
        Severity::High,
        "PAHs are potent carcinogens flagged by Health Canada.",
    ),
    (
        "Butylated Hydroxytoluene (BHT)",
        &["butylated hydroxytoluene", "bht"],
        Severity::High,
        "BHT is a synthetic antioxidant linked to endocrine disruption and restricted in several Canadian product categories.",
    ),
    (
        "Artificial Sweetener - Cyclamate",
        &["cyclamate", "sodium cyclamate", "calcium cyclamate"],
        Severity::High,
        "Cyclamate sweeteners are banned in Canada due to potential cancer risk.",
    ),
    // Flagged / under review
    (
        "Perfluoroalkyl Substances (PFAS)",
        &["pfas", "pfos", "pfoa", "perfluorooctane", "perfluorooctanoic", "perfluorinated"],
        Severity::Medium,
        "PFAS (forever chemicals) are under review in Canada for their persistence in the environment and potential health effects.",
    ),
    (
        "Triclosan",
        &["triclosan"],
        Severity::Medium,
        "Triclosan is an antimicrobial additive under review in Canada for potential endocrine-disrupting activity.",
    ),
    (
        "Bisphenol A (BPA)",
        &["bisphenol a", "bpa", "bisphenol"],
        Severity::Medium,
        "BPA is restricted in baby products in Canada and is under broader review as an endocrine disruptor.",
    ),
    (
        "Artificial Colours (Azo Dyes)",
        &[
            "red 40", "yellow 5", "yellow 6", "sunset yellow", "tartrazine", "amaranth",
            "allura red", "azo dye",
        ],
        Severity::Medium,
        "Several azo-based artificial colours are flagged by Health Canada for potential hyperactivity links in children.",
    ),
    (
        "Nitrates / Nitrites",
        &["sodium nitrate", "sodium nitrite", "potassium nitrate", "potassium nitrite"],
        Severity::Medium,
        "Nitrates and nitrites are preserved-meat additives under scrutiny in Canada for cancer risk at high intake levels.",
    ),
    (
        "Sodium Benzoate",
        &["sodium benzoate", "benzoic acid", "benzoate"],
        Severity::Medium,
        "Sodium benzoate is a preservative that can form benzene (a carcinogen) when combined with ascorbic acid. Flagged by Health Canada.",
    ),
];

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn builtin_tables() -> RuleSet {
    let diets = DIETS
        .iter()
        .map(|(name, hard_blocks, uncertain)| {
            (
                name.to_string(),
                DietRule {
                    hard_blocks: owned(hard_blocks),
                    uncertain: owned(uncertain),
                },
            )
        })
        .collect();

    let allergies = ALLERGIES
        .iter()
        .map(|(name, triggers)| (name.to_string(), owned(triggers)))
        .collect();

    let hotlist = HOTLIST
        .iter()
        .map(|(name, keywords, severity, reason)| HotlistRule {
            name: name.to_string(),
            keywords: owned(keywords),
            severity: *severity,
            reason: reason.to_string(),
        })
        .collect();

    RuleSet {
        diets,
        allergies,
        hotlist,
    }
}

lazy_static! {
    static ref BUILTIN_RULES: Arc<RuleSet> = {
        let rules = builtin_tables();
        if let Err(e) = rules.validate() {
            panic!("Built-in rule tables are invalid: {e:#}");
        }
        Arc::new(rules)
    };
}
