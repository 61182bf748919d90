//! Token-classification labels and span decoding.
//!
//! Models publish their label set as `id2label` in `config.json`, using
//! BIO/BILOU prefixes (`B-ORG`, `I-ORG`, `L-ORG`, `U-DATE`) or bare labels.
//! Per-token predictions are folded back into text spans using the
//! tokenizer's byte offsets and word ids.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use clausewise_core::RecognizedEntity;
use serde::Deserialize;

use crate::ModelError;

/// Upper bound on tokens per inference window.
pub const MAX_WINDOW_TOKENS: usize = 512;

const OUTSIDE: &str = "O";

/// Label id → label string, as declared by the model.
#[derive(Debug, Clone)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    /// Build from an `id2label` map. Ids missing from the map decode as `O`.
    pub fn from_id2label(id2label: &HashMap<String, String>) -> Result<Self, ModelError> {
        let mut entries = Vec::with_capacity(id2label.len());
        for (id, label) in id2label {
            let id: usize = id
                .trim()
                .parse()
                .map_err(|_| ModelError::Config(format!("non-numeric label id {id:?}")))?;
            entries.push((id, label.clone()));
        }

        let limit = id2label.len().saturating_mul(4);
        if let Some((id, _)) = entries.iter().find(|(id, _)| *id >= limit) {
            return Err(ModelError::Config(format!(
                "label id {id} out of range for {} labels",
                id2label.len()
            )));
        }

        let size = entries.iter().map(|(id, _)| id + 1).max().unwrap_or(0);
        let mut labels = vec![OUTSIDE.to_string(); size];
        for (id, label) in entries {
            labels[id] = label;
        }
        Ok(Self { labels })
    }

    pub fn label(&self, id: usize) -> &str {
        self.labels.get(id).map(String::as_str).unwrap_or(OUTSIDE)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Distinct entity types, prefixes stripped (e.g. `{"DATE", "ORG"}`).
    pub fn entity_types(&self) -> BTreeSet<&str> {
        self.labels
            .iter()
            .filter_map(|l| match Tag::parse(l) {
                Tag::Outside => None,
                Tag::Begin(ty) | Tag::Inside(ty) => Some(ty),
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct RawConfig {
    id2label: HashMap<String, String>,
    #[serde(default)]
    max_position_embeddings: Option<usize>,
}

/// The parts of a Hugging Face `config.json` the recognizer needs.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub labels: LabelMap,
    /// Tokens per window, capped at [`MAX_WINDOW_TOKENS`].
    pub max_length: usize,
}

impl ModelConfig {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let raw: RawConfig =
            serde_json::from_str(json).map_err(|e| ModelError::Config(e.to_string()))?;
        let labels = LabelMap::from_id2label(&raw.id2label)?;
        if labels.is_empty() {
            return Err(ModelError::Config("id2label is empty".into()));
        }
        let max_length = raw
            .max_position_embeddings
            .unwrap_or(MAX_WINDOW_TOKENS)
            .min(MAX_WINDOW_TOKENS);
        Ok(Self { labels, max_length })
    }

    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// A label split into its chunk position and entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag<'a> {
    Outside,
    /// `B-` or `U-`/`S-`: always opens a new span.
    Begin(&'a str),
    /// `I-`, `L-`/`E-`, or a bare label: continues a span of the same type.
    Inside(&'a str),
}

impl<'a> Tag<'a> {
    pub fn parse(label: &'a str) -> Self {
        if label.is_empty() || label == OUTSIDE {
            return Self::Outside;
        }
        match label.split_once('-') {
            Some(("B" | "U" | "S", ty)) => Self::Begin(ty),
            Some(("I" | "L" | "E", ty)) => Self::Inside(ty),
            _ => Self::Inside(label),
        }
    }
}

/// One token's prediction, positioned in the source text.
#[derive(Debug, Clone, Copy)]
pub struct TokenLabel<'a> {
    /// Byte offsets into the source text. Special tokens have `start == end`.
    pub start: usize,
    pub end: usize,
    /// Word index from the tokenizer; sub-tokens of one word share it.
    pub word: Option<u32>,
    pub label: &'a str,
}

struct OpenSpan<'a> {
    ty: &'a str,
    start: usize,
    end: usize,
}

/// Fold per-token labels into labelled spans of `text`.
///
/// Only the first sub-token of a word decides its label; continuation
/// sub-tokens extend whatever span is open.
pub fn decode_spans(text: &str, tokens: &[TokenLabel<'_>]) -> Vec<RecognizedEntity> {
    let mut spans = Vec::new();
    let mut open: Option<OpenSpan<'_>> = None;
    let mut prev_word: Option<u32> = None;

    for token in tokens {
        if token.start >= token.end {
            continue;
        }

        let continuation = token.word.is_some() && token.word == prev_word;
        prev_word = token.word;
        if continuation {
            if let Some(span) = open.as_mut() {
                span.end = token.end;
            }
            continue;
        }

        match Tag::parse(token.label) {
            Tag::Outside => close_span(text, open.take(), &mut spans),
            Tag::Begin(ty) => {
                close_span(text, open.take(), &mut spans);
                open = Some(OpenSpan {
                    ty,
                    start: token.start,
                    end: token.end,
                });
            }
            Tag::Inside(ty) => match open.as_mut() {
                Some(span) if span.ty == ty => span.end = token.end,
                _ => {
                    close_span(text, open.take(), &mut spans);
                    open = Some(OpenSpan {
                        ty,
                        start: token.start,
                        end: token.end,
                    });
                }
            },
        }
    }
    close_span(text, open.take(), &mut spans);

    spans
}

fn close_span(text: &str, span: Option<OpenSpan<'_>>, spans: &mut Vec<RecognizedEntity>) {
    if let Some(span) = span
        && let Some(surface) = text.get(span.start..span.end)
        && !surface.trim().is_empty()
    {
        spans.push(RecognizedEntity::new(surface, span.ty));
    }
}

/// Index of the highest score; 0 for an empty slice.
pub fn argmax(scores: &[f32]) -> usize {
    scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
