//! # Safe Bite
//!
//! Ingredient interpretation engine: turns raw ingredient label text into a
//! clean token list and checks it against diet rules, the user's allergies
//! and Canada's chemical Hotlist. Products are looked up by barcode and the
//! results are memoized in a bounded cache.
//!
//! ```rust
//! use safe_bite::{evaluate_label, RuleSet, ScanProfile};
//!
//! let rules = RuleSet::builtin();
//! let profile = ScanProfile::new(vec!["peanut".to_string()], Some("vegan".to_string()));
//! let verdict = evaluate_label("Ingredients: sugar, roasted peanuts, salt.", &profile, &rules);
//! assert!(verdict.allergy_check.is_fail());
//! assert!(verdict.diet_checks["vegan"].is_pass());
//! ```

pub mod allergy;
pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod diet;
pub mod errors;
pub mod evaluation;
pub mod explainer;
pub mod hotlist;
pub mod http;
pub mod normalizer;
pub mod product_source;
pub mod rules;
pub mod service;
pub mod speech;
pub mod verdict;

pub use errors::LookupError;
pub use evaluation::{AllergyHit, EvaluationResult, HotlistHit, Status};
pub use normalizer::{normalize, IngredientTokens};
pub use rules::{RuleSet, Severity};
pub use service::{ProductLookupService, ProductReport};
pub use verdict::{evaluate_label, ProductVerdict, ScanProfile};
