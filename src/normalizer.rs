//! # Ingredient Normalizer Module
//!
//! This module turns free-text ingredient labels into a clean, deduplicated
//! sequence of lowercase ingredient tokens that the rule evaluators match against.
//!
//! ## Features
//!
//! - Marketing qualifier removal ("organic", "non gmo", "100%", ...)
//! - Label boilerplate removal at segment boundaries ("ingredients:", "may contain", ...)
//! - Footnote mark removal and E-number canonicalization ("e-322" -> "e322")
//! - Parenthetical notes dropped (nesting-aware, commas inside a note never split)
//! - Order-preserving deduplication
//!
//! Conjunctions are never split delimiters: "mono and diglycerides" stays one
//! token. An "or" is only consumed when it prefixes a boilerplate phrase
//! ("or may contain: ...").

use lazy_static::lazy_static;
use log::{debug, trace};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Deref;

/// Characters that delimit ingredient segments
pub const SEGMENT_SEPARATORS: [char; 3] = [',', ';', '/'];

/// Footnote marks printed next to ingredients on labels
pub const FOOTNOTE_MARKS: [char; 3] = ['*', '†', '‡'];

// Longest alternatives first so "ingredients" wins over "ingredient". A period
// only counts as a boundary when followed by whitespace, so decimals like
// "8.7%" never open one.
const BOILERPLATE_PATTERN: &str = r"(?:^|[,:;]|\.\s)\s*(?:or\s+)?(?:for ingredients see|allergen information|ingredients|ingredient|may contain|contains|composition)\b\s*:?";

// Group 1 marks a "natural ..." compound that rule tables key on; it is kept intact
const MARKETING_PATTERN: &str = r"\b(?:organic|gluten[\s-]free|non[\s-]gmo)\b|\b100\s?%|\bnatural\b(\s+(?:flavou?rs?|sweeteners?))?";

// Sub-classes carry a letter suffix ("e150d", "e472e")
const E_NUMBER_PATTERN: &str = r"\be[\s-]?(\d{3,4}[a-z]?)\b";

lazy_static! {
    static ref MARKETING_REGEX: Regex =
        Regex::new(MARKETING_PATTERN).expect("Marketing word pattern should be valid");
    static ref BOILERPLATE_REGEX: Regex =
        Regex::new(BOILERPLATE_PATTERN).expect("Boilerplate pattern should be valid");
    static ref E_NUMBER_REGEX: Regex =
        Regex::new(E_NUMBER_PATTERN).expect("E-number pattern should be valid");
}

/// A normalized ingredient token sequence
///
/// Tokens are lowercase, trimmed, free of parentheses, hyphens and footnote
/// marks, and unique. Evaluation uses substring containment, so token
/// boundaries are advisory rather than exact-match keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngredientTokens(Vec<String>);

impl IngredientTokens {
    /// Wrap tokens that were already normalized elsewhere (e.g. a cached product)
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// Re-join the tokens into label text, the inverse of splitting
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

impl Deref for IngredientTokens {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for IngredientTokens {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Substring test shared by every evaluator: does any token contain `keyword`?
///
/// Rule keywords were authored for substring semantics, so "whey" must match
/// "whey powder".
pub fn contains_keyword<T: AsRef<str>>(tokens: &[T], keyword: &str) -> bool {
    tokens.iter().any(|token| token.as_ref().contains(keyword))
}

/// Normalize a raw ingredient label into tokens
///
/// Never fails: empty or unparseable text yields an empty sequence.
///
/// # Examples
///
/// ```rust
/// use safe_bite::normalizer::normalize;
///
/// let tokens = normalize("Organic Wheat Flour (contains gluten), Sugar*");
/// assert_eq!(tokens.as_slice(), ["wheat flour", "sugar"]);
/// ```
pub fn normalize(raw: &str) -> IngredientTokens {
    if raw.trim().is_empty() {
        trace!("Empty label text, nothing to normalize");
        return IngredientTokens::default();
    }

    let mut text = raw.to_lowercase();

    text = MARKETING_REGEX
        .replace_all(&text, |caps: &Captures| {
            if caps.get(1).is_some() {
                caps[0].to_string()
            } else {
                " ".to_string()
            }
        })
        .into_owned();

    text = strip_boilerplate(&text);

    text.retain(|c| !FOOTNOTE_MARKS.contains(&c));
    text = E_NUMBER_REGEX.replace_all(&text, "e$1").into_owned();
    text = text.replace('-', " ");
    text = strip_parentheticals(&text);

    // Dropped marks and notes can leave boilerplate opening a segment
    text = strip_boilerplate(&split_segments(&text).join(", "));

    let mut seen = HashSet::new();
    let tokens: Vec<String> = split_segments(&text)
        .into_iter()
        .filter(|segment| seen.insert(segment.clone()))
        .collect();

    debug!(
        "Normalized {} chars of label text into {} tokens",
        raw.len(),
        tokens.len()
    );
    trace!("Tokens: {:?}", tokens);

    IngredientTokens(tokens)
}

/// Normalize an already-split ingredient list
///
/// Items are joined with ", " and normalized as one label.
///
/// # Examples
///
/// ```rust
/// use safe_bite::normalizer::normalize_list;
///
/// let tokens = normalize_list(&["Sodium-Nitrite", "water", "Water"]);
/// assert_eq!(tokens.as_slice(), ["sodium nitrite", "water"]);
/// ```
pub fn normalize_list<S: AsRef<str>>(items: &[S]) -> IngredientTokens {
    let joined = items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(", ");
    normalize(&joined)
}

/// Replace boilerplate phrases at segment boundaries with a separator
///
/// Each replacement leaves a comma that can open a new boundary, so stacked
/// phrases ("ingredients: contains: ...") are removed by re-scanning until
/// nothing matches. Every pass removes at least one phrase, so it terminates.
fn strip_boilerplate(text: &str) -> String {
    let mut current = text.to_string();
    while BOILERPLATE_REGEX.is_match(&current) {
        let next = BOILERPLATE_REGEX.replace_all(&current, ",").into_owned();
        if next == current {
            break;
        }
        trace!("Removed label boilerplate: '{}' -> '{}'", current, next);
        current = next;
    }
    current
}

/// Drop every parenthetical note, including nested and unbalanced ones
///
/// A note that is never closed runs to the next segment separator; a stray
/// closing parenthesis is dropped on its own. Removed spans become a single
/// space so the surrounding words never merge.
fn strip_parentheticals(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut removed = vec![false; chars.len()];
    let mut open = Vec::new();

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '(' => open.push(i),
            ')' => match open.pop() {
                Some(start) => removed[start..=i].iter_mut().for_each(|r| *r = true),
                None => removed[i] = true,
            },
            _ => {}
        }
    }

    for start in open {
        let end = chars[start..]
            .iter()
            .position(|c| SEGMENT_SEPARATORS.contains(c))
            .map_or(chars.len(), |offset| start + offset);
        debug!("Unclosed parenthetical at char {}, dropping to char {}", start, end);
        removed[start..end].iter_mut().for_each(|r| *r = true);
    }

    let mut out = String::with_capacity(text.len());
    let mut in_gap = false;
    for (c, gone) in chars.into_iter().zip(removed) {
        if gone {
            if !in_gap {
                out.push(' ');
                in_gap = true;
            }
        } else {
            out.push(c);
            in_gap = false;
        }
    }
    out
}

/// Split on segment separators, keeping the non-empty cleaned segments
fn split_segments(text: &str) -> Vec<String> {
    text.split(|c: char| SEGMENT_SEPARATORS.contains(&c))
        .map(clean_segment)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Collapse whitespace and trim label punctuation left at segment edges
fn clean_segment(segment: &str) -> String {
    segment
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .trim_matches(|c: char| c == '.' || c == ':' || c.is_whitespace())
        .to_string()
}
