//! The statistical recognizer seam.
//!
//! A recognizer is constructed once per process and injected into the
//! [`Analyzer`](crate::Analyzer). Implementations must be read-only after
//! construction: the same text always yields the same spans.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::EntityKind;

/// A labelled span produced by a recognizer. Offsets are not retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedEntity {
    pub text: String,
    /// Raw recognizer label, e.g. `ORG`, `DATE`, `PERSON`.
    pub label: String,
}

impl RecognizedEntity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }

    /// The fact type this span counts towards, if any.
    pub fn kind(&self) -> Option<EntityKind> {
        EntityKind::from_label(&self.label)
    }
}

/// Inference failure while recognizing a single document.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RecognizeError {
    message: String,
}

impl RecognizeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Named-entity recognizer over normalized contract text.
pub trait EntityRecognizer: Send + Sync {
    /// Short identifier used in logs and errors (e.g. "onnx", "null").
    fn id(&self) -> &str;

    /// Recognize all labelled spans in `text`.
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, RecognizeError>;
}

/// Recognizer with no detection capability.
///
/// Used when no model could be loaded: every request yields zero entities,
/// which leaves the fallback patterns as the only entity source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecognizer;

impl EntityRecognizer for NullRecognizer {
    fn id(&self) -> &str {
        "null"
    }

    fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>, RecognizeError> {
        Ok(Vec::new())
    }
}
