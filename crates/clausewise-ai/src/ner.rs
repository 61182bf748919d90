//! ONNX Runtime token-classification recognizer.
//!
//! The model directory must contain `model.onnx`, `tokenizer.json` and a
//! Hugging Face `config.json` with `id2label`. Long texts are split into
//! overlapping windows by the tokenizer's truncation with stride, and each
//! window is labelled independently.

use std::path::Path;
use std::sync::Mutex;

use clausewise_core::{EntityRecognizer, RecognizeError, RecognizedEntity};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::ModelError;
use crate::labels::{LabelMap, ModelConfig, TokenLabel, argmax, decode_spans};

/// Tokens shared between consecutive windows.
const WINDOW_STRIDE: usize = 32;

/// Named-entity recognizer backed by a local ONNX model.
pub struct OnnxRecognizer {
    // `Session::run` needs exclusive access.
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: LabelMap,
    uses_token_types: bool,
}

impl OnnxRecognizer {
    /// Load a token-classification model from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self, ModelError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        for path in [&model_path, &tokenizer_path, &config_path] {
            if !path.exists() {
                return Err(ModelError::ModelUnavailable {
                    path: path.clone(),
                    reason: "file not found".into(),
                });
            }
        }

        let config = ModelConfig::from_file(&config_path)?;
        let session = Session::builder()?.commit_from_file(&model_path)?;
        let uses_token_types = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ModelError::Tokenizer(format!("load tokenizer: {e}")))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_length,
                stride: WINDOW_STRIDE.min(config.max_length / 4),
                ..Default::default()
            }))
            .map_err(|e| ModelError::Tokenizer(format!("set truncation: {e}")))?;
        tokenizer.with_padding(None);

        info!(
            model = %model_path.display(),
            labels = config.labels.len(),
            entity_types = ?config.labels.entity_types(),
            max_length = config.max_length,
            "loaded entity model"
        );
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels: config.labels,
            uses_token_types,
        })
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Label ids for every token of one window.
    fn predict(&self, window: &Encoding) -> Result<Vec<usize>, RecognizeError> {
        let seq_len = window.get_ids().len();
        let shape = [1i64, seq_len as i64];

        let to_tensor = |values: &[u32]| {
            let data: Vec<i64> = values.iter().map(|&v| v as i64).collect();
            Tensor::from_array((shape, data.into_boxed_slice())).map_err(runtime_error)
        };
        let ids = to_tensor(window.get_ids())?;
        let mask = to_tensor(window.get_attention_mask())?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| RecognizeError::new("model session lock poisoned"))?;
        let outputs = if self.uses_token_types {
            let types = to_tensor(window.get_type_ids())?;
            session.run(ort::inputs![
                "input_ids" => ids,
                "attention_mask" => mask,
                "token_type_ids" => types,
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => ids,
                "attention_mask" => mask,
            ])
        }
        .map_err(runtime_error)?;

        // Logits: [1, seq_len, num_labels].
        let (output_shape, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(runtime_error)?;
        let dims: &[i64] = output_shape;
        if dims.len() != 3 || dims[0] != 1 || dims[1] as usize != seq_len || dims[2] < 1 {
            return Err(RecognizeError::new(format!(
                "unexpected output shape: {dims:?}, expected [1, {seq_len}, labels]"
            )));
        }

        let num_labels = dims[2] as usize;
        Ok(logits.chunks(num_labels).map(argmax).collect())
    }
}

impl EntityRecognizer for OnnxRecognizer {
    fn id(&self) -> &str {
        "onnx"
    }

    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, RecognizeError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| RecognizeError::new(format!("tokenize: {e}")))?;
        let windows: Vec<&Encoding> = std::iter::once(&encoding)
            .chain(encoding.get_overflowing())
            .collect();

        let mut entities = Vec::new();
        for window in &windows {
            let predicted = self.predict(window)?;
            let tokens: Vec<TokenLabel<'_>> = window
                .get_offsets()
                .iter()
                .zip(window.get_word_ids())
                .zip(&predicted)
                .map(|((&(start, end), &word), &id)| TokenLabel {
                    start,
                    end,
                    word,
                    label: self.labels.label(id),
                })
                .collect();
            entities.extend(decode_spans(text, &tokens));
        }

        debug!(
            windows = windows.len(),
            entities = entities.len(),
            "recognized entities"
        );
        Ok(entities)
    }
}

fn runtime_error(e: ort::Error) -> RecognizeError {
    RecognizeError::new(format!("onnx runtime: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn model_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("models")
            .join("ner")
    }

    fn require_model() -> PathBuf {
        let dir = model_dir();
        if !dir.join("model.onnx").exists() {
            panic!(
                "Model not found. Export a token-classification model to models/ner/:\n  \
                 optimum-cli export onnx --model dslim/bert-base-NER --task token-classification models/ner"
            );
        }
        dir
    }

    #[test]
    fn missing_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = OnnxRecognizer::load(dir.path()).err().unwrap();
        match err {
            ModelError::ModelUnavailable { path, .. } => {
                assert!(path.ends_with("model.onnx"));
            }
            other => panic!("expected ModelUnavailable, got {other}"),
        }
    }

    #[test]
    #[ignore = "requires models/ner"]
    fn load_model() {
        let recognizer = OnnxRecognizer::load(&require_model()).unwrap();
        assert!(!recognizer.labels().is_empty());
        assert!(recognizer.labels().entity_types().contains("ORG"));
    }

    #[test]
    #[ignore = "requires models/ner"]
    fn recognizes_organizations() {
        let recognizer = OnnxRecognizer::load(&require_model()).unwrap();
        let found = recognizer
            .recognize("This Agreement is between Microsoft Corporation and Google.")
            .unwrap();
        assert!(
            found.iter().any(|e| e.label.ends_with("ORG")),
            "no ORG spans in {found:?}"
        );
    }

    #[test]
    #[ignore = "requires models/ner"]
    fn blank_text_yields_nothing() {
        let recognizer = OnnxRecognizer::load(&require_model()).unwrap();
        assert!(recognizer.recognize("  \n ").unwrap().is_empty());
    }

    #[test]
    #[ignore = "requires models/ner"]
    fn long_text_is_windowed() {
        let recognizer = OnnxRecognizer::load(&require_model()).unwrap();
        let clause = "Payment is due to Microsoft Corporation within thirty days. ";
        let text = clause.repeat(200);
        let found = recognizer.recognize(&text).unwrap();
        assert!(!found.is_empty());
    }
}
