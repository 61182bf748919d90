//! Keyword-driven risk classification.
//!
//! The text is lower-cased and each vocabulary term is tested by unanchored
//! substring containment, so a term inside a longer word still matches
//! ("determinate" contains "terminate"). The test lives behind
//! [`TermMatcher`] so a stricter matcher can replace it without touching
//! callers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Risk terms in reporting order.
pub const RISK_VOCABULARY: &[&str] = &["penalty", "terminate", "liability", "indemnity"];

/// Decides whether `term` occurs in already lower-cased `haystack`.
pub type TermMatcher = fn(haystack: &str, term: &str) -> bool;

/// Unanchored substring containment.
pub fn substring_match(haystack: &str, term: &str) -> bool {
    haystack.contains(term)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk level plus the vocabulary terms that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VerdictFields")]
pub struct RiskVerdict {
    level: RiskLevel,
    matched_terms: Vec<String>,
}

#[derive(Deserialize)]
struct VerdictFields {
    level: RiskLevel,
    matched_terms: Vec<String>,
}

impl TryFrom<VerdictFields> for RiskVerdict {
    type Error = String;

    /// The level must agree with the terms: HIGH iff any term matched.
    fn try_from(fields: VerdictFields) -> Result<Self, Self::Error> {
        let verdict = Self::from_matches(fields.matched_terms);
        if verdict.level != fields.level {
            return Err(format!(
                "risk level {} inconsistent with {} matched terms",
                fields.level,
                verdict.matched_terms.len()
            ));
        }
        Ok(verdict)
    }
}

impl RiskVerdict {
    /// HIGH when any term matched, LOW (with no terms) otherwise.
    pub fn from_matches(matched_terms: Vec<String>) -> Self {
        let level = if matched_terms.is_empty() {
            RiskLevel::Low
        } else {
            RiskLevel::High
        };
        Self {
            level,
            matched_terms,
        }
    }

    pub fn level(&self) -> RiskLevel {
        self.level
    }

    /// Matched terms in vocabulary order. Empty when the level is LOW.
    pub fn matched_terms(&self) -> &[String] {
        &self.matched_terms
    }

    pub fn is_high(&self) -> bool {
        self.level == RiskLevel::High
    }
}

/// Scans text for the fixed risk vocabulary.
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    vocabulary: &'static [&'static str],
    matcher: TermMatcher,
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self {
            vocabulary: RISK_VOCABULARY,
            matcher: substring_match,
        }
    }
}

impl RiskClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the term test, e.g. with a word-boundary matcher.
    pub fn with_matcher(mut self, matcher: TermMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn vocabulary(&self) -> &[&'static str] {
        self.vocabulary
    }

    pub fn classify(&self, text: &str) -> RiskVerdict {
        let lowered = text.to_lowercase();
        let matched = self
            .vocabulary
            .iter()
            .filter(|term| (self.matcher)(&lowered, term))
            .map(|term| term.to_string())
            .collect();
        RiskVerdict::from_matches(matched)
    }
}
