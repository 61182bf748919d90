//! Local inference for contract entity recognition.
//!
//! With the `onnx` feature, [`load_recognizer`] loads a token-classification
//! model from disk. Without it, or when the model cannot be loaded, analysis
//! runs in degraded mode on the pattern fallbacks alone.

use std::path::Path;
use std::sync::Arc;

use clausewise_core::{EntityRecognizer, NullRecognizer};
use tracing::warn;

mod error;
pub mod labels;
#[cfg(feature = "onnx")]
mod ner;

pub use error::ModelError;
#[cfg(feature = "onnx")]
pub use ner::OnnxRecognizer;

/// Load the entity recognizer from `model_dir`.
///
/// Returns the model-backed recognizer on success. Any failure is logged
/// and replaced by [`NullRecognizer`], so callers always get a usable
/// recognizer.
pub fn load_recognizer(model_dir: Option<&Path>) -> Arc<dyn EntityRecognizer> {
    let Some(dir) = model_dir else {
        warn!("no entity model configured, using pattern fallbacks only");
        return Arc::new(NullRecognizer);
    };
    match try_load(dir) {
        Ok(recognizer) => recognizer,
        Err(e) => {
            warn!(error = %e, dir = %dir.display(), "entity model unavailable, using pattern fallbacks only");
            Arc::new(NullRecognizer)
        }
    }
}

/// Load the model-backed recognizer, surfacing the failure.
#[cfg(feature = "onnx")]
pub fn try_load(model_dir: &Path) -> Result<Arc<dyn EntityRecognizer>, ModelError> {
    Ok(Arc::new(OnnxRecognizer::load(model_dir)?))
}

#[cfg(not(feature = "onnx"))]
pub fn try_load(model_dir: &Path) -> Result<Arc<dyn EntityRecognizer>, ModelError> {
    Err(ModelError::ModelUnavailable {
        path: model_dir.to_path_buf(),
        reason: "built without the `onnx` feature".into(),
    })
}
