//! Pipeline driver and result assembly.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::amounts::extract_amounts;
use crate::document::SourceDocument;
use crate::entities::{EntityExtractor, ExtractedEntities};
use crate::recognizer::EntityRecognizer;
use crate::risk::{RiskClassifier, RiskVerdict};
use crate::AnalysisError;

/// Everything extracted from one document.
///
/// Built once by [`AnalysisResult::assemble`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    text: String,
    parties: BTreeSet<String>,
    dates: BTreeSet<String>,
    amounts: Vec<String>,
    verdict: RiskVerdict,
}

impl AnalysisResult {
    pub fn assemble(
        text: String,
        entities: ExtractedEntities,
        amounts: Vec<String>,
        verdict: RiskVerdict,
    ) -> Self {
        Self {
            text,
            parties: entities.organizations,
            dates: entities.dates,
            amounts,
            verdict,
        }
    }

    /// The normalized text the facts were extracted from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parties(&self) -> &BTreeSet<String> {
        &self.parties
    }

    pub fn dates(&self) -> &BTreeSet<String> {
        &self.dates
    }

    /// Amounts in first-occurrence order, duplicates included.
    pub fn amounts(&self) -> &[String] {
        &self.amounts
    }

    pub fn verdict(&self) -> &RiskVerdict {
        &self.verdict
    }
}

/// Contract analysis pipeline.
///
/// Holds the process-wide recognizer (shared read-only) and the
/// deterministic extractors. Each call is independent: the same text always
/// yields the same result.
pub struct Analyzer {
    recognizer: Arc<dyn EntityRecognizer>,
    entities: EntityExtractor,
    risk: RiskClassifier,
}

impl Analyzer {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self {
            recognizer,
            entities: EntityExtractor::default(),
            risk: RiskClassifier::default(),
        }
    }

    pub fn with_entity_extractor(mut self, entities: EntityExtractor) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_risk_classifier(mut self, risk: RiskClassifier) -> Self {
        self.risk = risk;
        self
    }

    pub fn recognizer_id(&self) -> &str {
        self.recognizer.id()
    }

    /// Normalize a source document and analyze its text.
    pub fn analyze(&self, source: &SourceDocument) -> Result<AnalysisResult, AnalysisError> {
        let text = source.normalize()?;
        self.analyze_text(text)
    }

    /// Analyze already-normalized text.
    pub fn analyze_text(&self, text: impl Into<String>) -> Result<AnalysisResult, AnalysisError> {
        let text = text.into();

        let entities = self.entities.extract(self.recognizer.as_ref(), &text)?;
        let amounts = extract_amounts(&text);
        let verdict = self.risk.classify(&text);

        info!(
            recognizer = self.recognizer.id(),
            parties = entities.organizations.len(),
            dates = entities.dates.len(),
            amounts = amounts.len(),
            risk = %verdict.level(),
            "analysis complete"
        );

        Ok(AnalysisResult::assemble(text, entities, amounts, verdict))
    }
}
