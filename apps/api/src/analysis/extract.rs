//! Text Extractor — converts raw document bytes into plain text.
//!
//! Dispatches on declared MIME type, then filename extension: PDF, DOCX, or
//! plain UTF-8. Parser failures never propagate; they become an empty
//! `ExtractedText` with a diagnostic explaining what went wrong.

use anyhow::{Context, Result};
use bytes::Bytes;
use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};
use serde::Serialize;
use tracing::debug;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A document as submitted by the caller. Not retained after extraction.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Bytes,
    pub filename: String,
    pub declared_mime: Option<String>,
}

/// The result of text extraction. `text` is empty when nothing could be
/// recovered; `diagnostic` explains why.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedText {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl ExtractedText {
    pub fn from_raw_text(text: String) -> Self {
        if text.trim().is_empty() {
            Self {
                text: String::new(),
                diagnostic: Some("no extractable text in submitted document".to_string()),
            }
        } else {
            Self {
                text,
                diagnostic: None,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Pdf,
    Docx,
    Plain,
}

impl DocumentFormat {
    fn label(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::Plain => "plain-text",
        }
    }
}

/// Extracts plain text from a raw document. Total: always returns an
/// `ExtractedText`, never an error.
pub fn extract(doc: &RawDocument) -> ExtractedText {
    let format = detect_format(doc);
    debug!(
        filename = %doc.filename,
        format = format.label(),
        size = doc.bytes.len(),
        "Extracting document text"
    );

    let parsed = match format {
        DocumentFormat::Pdf => pdf_text(&doc.bytes),
        DocumentFormat::Docx => docx_text(&doc.bytes),
        DocumentFormat::Plain => Ok(String::from_utf8_lossy(&doc.bytes).into_owned()),
    };

    match parsed {
        Ok(text) if text.trim().is_empty() => ExtractedText {
            text: String::new(),
            diagnostic: Some(format!(
                "no extractable text in {} document (it may be scanned or image-only)",
                format.label()
            )),
        },
        Ok(text) => ExtractedText {
            text,
            diagnostic: None,
        },
        Err(e) => ExtractedText {
            text: String::new(),
            diagnostic: Some(format!("failed to parse {} document: {e:#}", format.label())),
        },
    }
}

fn detect_format(doc: &RawDocument) -> DocumentFormat {
    let filename = doc.filename.to_lowercase();
    let mime = doc.declared_mime.as_deref().unwrap_or("");

    if mime.eq_ignore_ascii_case("application/pdf") || filename.ends_with(".pdf") {
        DocumentFormat::Pdf
    } else if mime.eq_ignore_ascii_case(DOCX_MIME) || filename.ends_with(".docx") {
        DocumentFormat::Docx
    } else {
        DocumentFormat::Plain
    }
}

fn pdf_text(bytes: &[u8]) -> Result<String> {
    // pdf-extract can panic on malformed files, not just return Err.
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes).context("PDF parsing failed")
    }))
    .unwrap_or_else(|_| Err(anyhow::anyhow!("PDF parser aborted on malformed input")))
}

fn docx_text(bytes: &[u8]) -> Result<String> {
    let package = docx_rs::read_docx(bytes).context("DOCX parsing failed")?;

    let mut segments = Vec::new();
    for child in &package.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => {
                if let Some(text) = paragraph_text(paragraph) {
                    segments.push(text);
                }
            }
            DocumentChild::Table(table) => collect_table_text(table, &mut segments),
            _ => {}
        }
    }

    Ok(segments.join("\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> Option<String> {
    let mut buffer = String::new();
    for child in &paragraph.children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(text) => buffer.push_str(&text.text),
                        RunChild::Break(_) => buffer.push('\n'),
                        RunChild::Tab(_) => buffer.push('\t'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(hyperlink) => {
                for inner in &hyperlink.children {
                    if let ParagraphChild::Run(run) = inner {
                        for run_child in &run.children {
                            if let RunChild::Text(text) = run_child {
                                buffer.push_str(&text.text);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    let trimmed = buffer.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn collect_table_text(table: &Table, segments: &mut Vec<String>) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell;
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(paragraph) => {
                        if let Some(text) = paragraph_text(paragraph) {
                            segments.push(text);
                        }
                    }
                    TableCellContent::Table(inner) => collect_table_text(inner, segments),
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(bytes: &[u8], filename: &str, mime: Option<&str>) -> RawDocument {
        RawDocument {
            bytes: Bytes::copy_from_slice(bytes),
            filename: filename.to_string(),
            declared_mime: mime.map(str::to_string),
        }
    }

    #[test]
    fn test_plain_text_passthrough() {
        let extracted = extract(&doc(b"Senior engineer with Rust experience", "resume.txt", None));
        assert_eq!(extracted.text, "Senior engineer with Rust experience");
        assert!(extracted.diagnostic.is_none());
    }

    #[test]
    fn test_unknown_format_treated_as_utf8() {
        let extracted = extract(&doc(b"some resume text", "resume.unknown", None));
        assert_eq!(extracted.text, "some resume text");
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let extracted = extract(&doc(&[0x66, 0x6f, 0x6f, 0xff, 0x62, 0x61, 0x72], "r.txt", None));
        assert!(extracted.text.starts_with("foo"));
        assert!(extracted.text.ends_with("bar"));
    }

    #[test]
    fn test_empty_document_yields_diagnostic() {
        let extracted = extract(&doc(b"   \n\t ", "resume.txt", None));
        assert!(extracted.text.is_empty());
        assert!(extracted.diagnostic.is_some());
    }

    #[test]
    fn test_garbage_pdf_yields_diagnostic_not_panic() {
        let extracted = extract(&doc(b"definitely not a pdf", "resume.pdf", None));
        assert!(extracted.text.is_empty());
        let diag = extracted.diagnostic.expect("expected a diagnostic");
        assert!(diag.contains("PDF"), "diagnostic should name the format: {diag}");
    }

    #[test]
    fn test_garbage_docx_yields_diagnostic_not_panic() {
        let extracted = extract(&doc(b"not a zip archive", "resume.docx", None));
        assert!(extracted.text.is_empty());
        assert!(extracted.diagnostic.unwrap().contains("DOCX"));
    }

    #[test]
    fn test_mime_takes_precedence_over_extension() {
        // Declared PDF MIME wins even with a .txt extension
        let extracted = extract(&doc(b"plain words", "resume.txt", Some("application/pdf")));
        assert!(extracted.text.is_empty());
        assert!(extracted.diagnostic.is_some());
    }

    #[test]
    fn test_from_raw_text_empty_input() {
        let extracted = ExtractedText::from_raw_text("  ".to_string());
        assert!(extracted.text.is_empty());
        assert!(extracted.diagnostic.is_some());
    }
}
