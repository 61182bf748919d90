//! Text normalisation: turns an uploaded PDF or plain-text byte stream into
//! the single text string every extractor works on.
//!
//! No whitespace collapsing or case folding happens here. PDF pages are
//! concatenated in document order; a page without extractable text adds
//! nothing rather than failing the document.

use std::fmt;
use std::path::Path;

use lopdf::Document;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::AnalysisError;

/// Declared type of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Pdf,
    PlainText,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::PlainText => "text/plain",
        }
    }

    /// Parse a MIME type. Parameters such as `; charset=utf-8` are ignored.
    pub fn from_mime(mime: &str) -> Result<Self, AnalysisError> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => Ok(Self::Pdf),
            "text/plain" => Ok(Self::PlainText),
            _ => Err(AnalysisError::UnsupportedContentType(mime.to_string())),
        }
    }

    /// Infer the content type from a file extension (`.pdf`, `.txt`).
    pub fn from_path(path: &Path) -> Result<Self, AnalysisError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("txt") | Some("text") => Ok(Self::PlainText),
            _ => Err(AnalysisError::UnsupportedContentType(
                path.display().to_string(),
            )),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Raw document bytes tagged with their declared content type.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    bytes: Vec<u8>,
    content_type: ContentType,
}

impl SourceDocument {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: ContentType) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }

    pub fn pdf(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(bytes, ContentType::Pdf)
    }

    pub fn plain_text(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(bytes, ContentType::PlainText)
    }

    /// Read a file, inferring its content type from the extension.
    pub fn from_file(path: &Path) -> Result<Self, AnalysisError> {
        let content_type = ContentType::from_path(path)?;
        let bytes = std::fs::read(path)?;
        Ok(Self::new(bytes, content_type))
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Produce the normalized text for this document.
    ///
    /// Fails with [`AnalysisError::UnreadableDocument`] when the bytes cannot
    /// be parsed as the declared type (corrupt PDF, invalid UTF-8).
    pub fn normalize(&self) -> Result<String, AnalysisError> {
        match self.content_type {
            ContentType::Pdf => pdf_text(&self.bytes),
            ContentType::PlainText => std::str::from_utf8(&self.bytes)
                .map(str::to_owned)
                .map_err(|e| AnalysisError::UnreadableDocument {
                    content_type: ContentType::PlainText,
                    reason: e.to_string(),
                }),
        }
    }
}

fn pdf_text(bytes: &[u8]) -> Result<String, AnalysisError> {
    let doc = Document::load_mem(bytes).map_err(|e| AnalysisError::UnreadableDocument {
        content_type: ContentType::Pdf,
        reason: e.to_string(),
    })?;

    let pages = doc.get_pages();
    let mut text = String::new();
    for &page_num in pages.keys() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => debug!(page = page_num, error = %e, "page has no extractable text"),
        }
    }

    info!(
        pages = pages.len(),
        chars = text.chars().count(),
        "extracted pdf text"
    );
    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Build an in-memory PDF with one page per entry; `None` is a page
    /// whose content stream draws no text.
    pub(crate) fn pdf_bytes(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids = Vec::new();
        for page in pages {
            let operations = match page {
                Some(line) => vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
                None => vec![],
            };
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn plain_text_passes_through_unchanged() {
        let raw = "  Payment of \u{20b9}50,000\n\nTERMINATE  ";
        let doc = SourceDocument::plain_text(raw.as_bytes());
        assert_eq!(doc.normalize().unwrap(), raw);
    }

    #[test]
    fn empty_plain_text_is_valid() {
        let doc = SourceDocument::plain_text(Vec::new());
        assert_eq!(doc.normalize().unwrap(), "");
    }

    #[test]
    fn invalid_utf8_is_unreadable() {
        let doc = SourceDocument::plain_text(vec![0x66, 0x6f, 0xff, 0xfe]);
        let err = doc.normalize().unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UnreadableDocument {
                content_type: ContentType::PlainText,
                ..
            }
        ));
    }

    #[test]
    fn corrupt_pdf_is_unreadable() {
        let doc = SourceDocument::pdf(b"this is not a pdf".to_vec());
        let err = doc.normalize().unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UnreadableDocument {
                content_type: ContentType::Pdf,
                ..
            }
        ));
    }

    #[test]
    fn pdf_pages_concatenate_in_order() {
        let bytes = pdf_bytes(&[
            Some("Acme Technologies shall deliver"),
            Some("within 12 months"),
        ]);
        let text = SourceDocument::pdf(bytes).normalize().unwrap();

        let first = text.find("Acme Technologies").expect("first page text");
        let second = text.find("12 months").expect("second page text");
        assert!(first < second, "pages out of order: {text:?}");
    }

    #[test]
    fn pdf_page_without_text_contributes_nothing() {
        let bytes = pdf_bytes(&[None, Some("Beta Solutions"), None]);
        let text = SourceDocument::pdf(bytes).normalize().unwrap();
        assert!(text.contains("Beta Solutions"));
        assert_eq!(text.trim(), "Beta Solutions");
    }

    #[test]
    fn mime_parsing() {
        assert_eq!(
            ContentType::from_mime("application/pdf").unwrap(),
            ContentType::Pdf
        );
        assert_eq!(
            ContentType::from_mime("text/plain; charset=utf-8").unwrap(),
            ContentType::PlainText
        );
        assert!(matches!(
            ContentType::from_mime("image/png"),
            Err(AnalysisError::UnsupportedContentType(_))
        ));
    }

    #[test]
    fn extension_inference() {
        assert_eq!(
            ContentType::from_path(Path::new("lease.PDF")).unwrap(),
            ContentType::Pdf
        );
        assert_eq!(
            ContentType::from_path(Path::new("nda.txt")).unwrap(),
            ContentType::PlainText
        );
        assert!(ContentType::from_path(Path::new("contract.docx")).is_err());
        assert!(ContentType::from_path(Path::new("contract")).is_err());
    }

    #[test]
    fn from_file_reads_and_infers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msa.txt");
        std::fs::write(&path, "Either party may terminate.").unwrap();

        let doc = SourceDocument::from_file(&path).unwrap();
        assert_eq!(doc.content_type(), ContentType::PlainText);
        assert_eq!(doc.normalize().unwrap(), "Either party may terminate.");
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceDocument::from_file(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }
}
