use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("entity model unavailable at {path}: {reason}")]
    ModelUnavailable { path: PathBuf, reason: String },

    #[error("invalid model config: {0}")]
    Config(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Runtime(#[from] ort::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
