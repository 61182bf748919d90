//! Contract analysis pipeline: normalisation, entity and amount extraction,
//! keyword risk classification, and result assembly.

pub mod amounts;
pub mod analysis;
pub mod document;
pub mod entities;
mod error;
pub mod recognizer;
pub mod report;
pub mod risk;

pub use amounts::extract_amounts;
pub use analysis::{AnalysisResult, Analyzer};
pub use document::{ContentType, SourceDocument};
pub use entities::{EntityExtractor, EntityKind, EntityTier, ExtractedEntities, PatternFallback};
pub use error::AnalysisError;
pub use recognizer::{EntityRecognizer, NullRecognizer, RecognizeError, RecognizedEntity};
pub use report::{ReportBuilder, report_schema};
pub use risk::{RiskClassifier, RiskLevel, RiskVerdict, TermMatcher};
