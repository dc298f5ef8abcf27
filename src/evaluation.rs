//! # Evaluation Result Types
//!
//! Every evaluator family reports through the same tagged variant, serialized
//! with a `status` discriminator: `{ "status": "fail", "reason": ..., "hits": [...] }`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rules::Severity;

/// Outcome of one evaluator for one rule family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EvaluationResult<H> {
    /// Nothing matched
    Pass { reason: String },
    /// A disqualifying match, with every hit the evaluator collected
    Fail { reason: String, hits: Vec<H> },
    /// Only cautionary matches (diets only)
    Uncertain { reason: String, hits: Vec<H> },
    /// The requested diet has no configured rules
    Unknown { reason: String },
}

/// Status discriminator without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    Uncertain,
    Unknown,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
            Status::Uncertain => "uncertain",
            Status::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

impl<H> EvaluationResult<H> {
    pub fn pass(reason: impl Into<String>) -> Self {
        EvaluationResult::Pass {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            EvaluationResult::Pass { .. } => Status::Pass,
            EvaluationResult::Fail { .. } => Status::Fail,
            EvaluationResult::Uncertain { .. } => Status::Uncertain,
            EvaluationResult::Unknown { .. } => Status::Unknown,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            EvaluationResult::Pass { reason }
            | EvaluationResult::Fail { reason, .. }
            | EvaluationResult::Uncertain { reason, .. }
            | EvaluationResult::Unknown { reason } => reason,
        }
    }

    /// Matched hits; empty for `pass` and `unknown`
    pub fn hits(&self) -> &[H] {
        match self {
            EvaluationResult::Fail { hits, .. } | EvaluationResult::Uncertain { hits, .. } => hits,
            EvaluationResult::Pass { .. } | EvaluationResult::Unknown { .. } => &[],
        }
    }

    pub fn is_pass(&self) -> bool {
        self.status() == Status::Pass
    }

    pub fn is_fail(&self) -> bool {
        self.status() == Status::Fail
    }
}

/// One matched allergy: the allergy as requested and the trigger that proved it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllergyHit {
    pub allergy: String,
    pub ingredient: String,
}

/// One matched hotlist chemical
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotlistHit {
    pub chemical: String,
    pub severity: Severity,
    pub matched_keyword: String,
    pub reason: String,
}

/// Diet verdict; hits are the matched keywords
pub type DietCheck = EvaluationResult<String>;
pub type AllergyCheck = EvaluationResult<AllergyHit>;
pub type HotlistCheck = EvaluationResult<HotlistHit>;
