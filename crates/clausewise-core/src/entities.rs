//! Entity extraction: organizations and date/duration expressions.
//!
//! Extraction is an ordered chain of [`EntityTier`]s evaluated per fact
//! type. The recognizer's spans form the first tier; pattern fallbacks follow.
//! A later tier is consulted for a fact type only when every earlier tier
//! produced nothing for it, and its result replaces (never extends) the
//! earlier, empty one.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AnalysisError;
use crate::recognizer::{EntityRecognizer, RecognizedEntity};

/// Closed set of fact types the extractor produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Organization,
    DurationOrDate,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [Self::Organization, Self::DurationOrDate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "ORGANIZATION",
            Self::DurationOrDate => "DURATION_OR_DATE",
        }
    }

    /// Map a recognizer label onto a fact type. Unknown labels are ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_uppercase().as_str() {
            "ORG" | "ORGANIZATION" | "ORGANISATION" => Some(Self::Organization),
            "DATE" => Some(Self::DurationOrDate),
            _ => None,
        }
    }
}

/// One source of entities in the extraction chain.
pub trait EntityTier: Send + Sync {
    fn name(&self) -> &str;

    /// Deduplicated surface strings of `kind` found in `text`.
    fn extract(&self, text: &str, kind: EntityKind) -> BTreeSet<String>;
}

/// Deduplicated extraction output for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedEntities {
    pub organizations: BTreeSet<String>,
    pub dates: BTreeSet<String>,
}

impl ExtractedEntities {
    pub fn get(&self, kind: EntityKind) -> &BTreeSet<String> {
        match kind {
            EntityKind::Organization => &self.organizations,
            EntityKind::DurationOrDate => &self.dates,
        }
    }

    fn get_mut(&mut self, kind: EntityKind) -> &mut BTreeSet<String> {
        match kind {
            EntityKind::Organization => &mut self.organizations,
            EntityKind::DurationOrDate => &mut self.dates,
        }
    }
}

// ── Primary tier ──

/// Spans the recognizer produced for the current document, grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct RecognizedTier {
    spans: ExtractedEntities,
}

impl RecognizedTier {
    pub fn from_entities(entities: &[RecognizedEntity]) -> Self {
        let mut spans = ExtractedEntities::default();
        for entity in entities {
            if entity.text.trim().is_empty() {
                continue;
            }
            if let Some(kind) = entity.kind() {
                spans.get_mut(kind).insert(entity.text.clone());
            }
        }
        Self { spans }
    }
}

impl EntityTier for RecognizedTier {
    fn name(&self) -> &str {
        "recognizer"
    }

    fn extract(&self, _text: &str, kind: EntityKind) -> BTreeSet<String> {
        self.spans.get(kind).clone()
    }
}

// ── Pattern fallback tier ──

/// Legal-entity suffixes that end a fallback organization match.
pub const ORG_SUFFIXES: &[&str] = &[
    "Technologies",
    "Solutions",
    "Corporation",
    "Ltd",
    "Private Limited",
];

/// Capitalised words (or `&`) followed by a suffix from [`ORG_SUFFIXES`].
///
/// Words are separated by spaces or tabs only; a line break ends a name.
/// Lower-case words break a match, so "between Acme Technologies and Beta
/// Solutions" yields two organizations rather than one long run.
static ORG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let suffixes = ORG_SUFFIXES
        .iter()
        .map(|s| s.replace(' ', r"[ \t]+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"\b[A-Z][A-Za-z&]*(?:[ \t]+(?:&|[A-Z][A-Za-z&]*))*[ \t]+(?:{suffixes})\b"
    ))
    .expect("organization fallback pattern should compile")
});

/// `<integer> month(s)` or `<integer> year(s)`, case-sensitive.
static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+[ \t]+(?:months?|years?)\b")
        .expect("duration fallback pattern should compile")
});

/// Deterministic fallback for organizations and durations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternFallback;

impl EntityTier for PatternFallback {
    fn name(&self) -> &str {
        "pattern"
    }

    fn extract(&self, text: &str, kind: EntityKind) -> BTreeSet<String> {
        match kind {
            EntityKind::Organization => fallback_organizations(text),
            EntityKind::DurationOrDate => fallback_durations(text),
        }
    }
}

pub fn fallback_organizations(text: &str) -> BTreeSet<String> {
    ORG_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn fallback_durations(text: &str) -> BTreeSet<String> {
    DURATION_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

// ── Extractor ──

/// Runs the recognizer and resolves each fact type through the tier chain.
pub struct EntityExtractor {
    fallbacks: Vec<Box<dyn EntityTier>>,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self {
            fallbacks: vec![Box::new(PatternFallback)],
        }
    }
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An extractor that trusts the recognizer alone.
    pub fn without_fallbacks() -> Self {
        Self {
            fallbacks: Vec::new(),
        }
    }

    /// Append a fallback tier after the existing ones.
    pub fn with_fallback(mut self, tier: impl EntityTier + 'static) -> Self {
        self.fallbacks.push(Box::new(tier));
        self
    }

    /// Names of the fallback tiers, in evaluation order.
    pub fn fallback_names(&self) -> Vec<&str> {
        self.fallbacks.iter().map(|t| t.name()).collect()
    }

    /// Recognize entities in `text` and resolve both fact types.
    pub fn extract(
        &self,
        recognizer: &dyn EntityRecognizer,
        text: &str,
    ) -> Result<ExtractedEntities, AnalysisError> {
        let recognized = recognizer
            .recognize(text)
            .map_err(|source| AnalysisError::Recognizer {
                recognizer: recognizer.id().to_string(),
                source,
            })?;
        let primary = RecognizedTier::from_entities(&recognized);
        Ok(self.resolve(&primary, text))
    }

    /// Resolve both fact types with `primary` ahead of the fallbacks.
    pub fn resolve(&self, primary: &dyn EntityTier, text: &str) -> ExtractedEntities {
        let mut tiers: Vec<&dyn EntityTier> = Vec::with_capacity(self.fallbacks.len() + 1);
        tiers.push(primary);
        tiers.extend(self.fallbacks.iter().map(|t| &**t));

        let mut out = ExtractedEntities::default();
        for kind in EntityKind::ALL {
            *out.get_mut(kind) = resolve_kind(&tiers, text, kind);
        }
        out
    }
}

fn resolve_kind(tiers: &[&dyn EntityTier], text: &str, kind: EntityKind) -> BTreeSet<String> {
    for tier in tiers {
        let found = tier.extract(text, kind);
        if !found.is_empty() {
            debug!(
                tier = tier.name(),
                kind = kind.as_str(),
                count = found.len(),
                "entity tier resolved"
            );
            return found;
        }
    }
    BTreeSet::new()
}
