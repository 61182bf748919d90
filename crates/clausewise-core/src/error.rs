use thiserror::Error;

use crate::document::ContentType;
use crate::recognizer::RecognizeError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("unreadable {content_type} document: {reason}")]
    UnreadableDocument {
        content_type: ContentType,
        reason: String,
    },

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("recognizer '{recognizer}' failed: {source}")]
    Recognizer {
        recognizer: String,
        #[source]
        source: RecognizeError,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
