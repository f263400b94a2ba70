//! Plain-text extraction from uploaded files, dispatched on file extension.
//!
//! `.txt` is always available. `.pdf` and `.docx` require the `pdf` and
//! `docx` features; when a feature is disabled the format is reported as
//! unsupported.

use std::path::Path;

use tracing::debug;
#[cfg(feature = "pdf")]
use tracing::warn;

use crate::error::{RagError, Result};

/// File formats with a text extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Pdf,
    Txt,
    Docx,
}

impl FileFormat {
    /// Lowercased extension of `filename` including the leading dot, or an empty string.
    pub fn extension_of(filename: &str) -> String {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default()
    }

    /// Determine the format from a file name.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedFormat`] for any extension other than
    /// `.pdf`, `.txt` or `.docx`.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = Self::extension_of(filename);
        match extension.as_str() {
            ".pdf" => Ok(Self::Pdf),
            ".txt" => Ok(Self::Txt),
            ".docx" => Ok(Self::Docx),
            _ => Err(RagError::UnsupportedFormat { filename: filename.to_string(), extension }),
        }
    }
}

/// Turns uploaded file bytes into raw document text.
pub trait TextExtractor: Send + Sync {
    /// Extract the text of `bytes`, using `filename` to pick the format.
    fn extract(&self, bytes: &[u8], filename: &str) -> Result<String>;
}

/// The built-in [`TextExtractor`] covering `.txt`, `.pdf` and `.docx`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTextExtractor;

impl TextExtractor for DefaultTextExtractor {
    fn extract(&self, bytes: &[u8], filename: &str) -> Result<String> {
        extract_text(bytes, filename)
    }
}

/// Extract plain text from a file's bytes.
///
/// # Errors
///
/// - [`RagError::UnsupportedFormat`] for unknown extensions or formats whose
///   feature is disabled.
/// - [`RagError::Extraction`] when the bytes cannot be decoded.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<String> {
    let format = FileFormat::from_filename(filename)?;
    debug!(filename, ?format, size = bytes.len(), "extracting text");

    match format {
        FileFormat::Txt => String::from_utf8(bytes.to_vec()).map_err(|e| RagError::Extraction {
            filename: filename.to_string(),
            message: format!("file is not valid UTF-8: {e}"),
        }),
        FileFormat::Pdf => extract_pdf(bytes, filename),
        FileFormat::Docx => extract_docx(bytes, filename),
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(bytes: &[u8], filename: &str) -> Result<String> {
    // pdf-extract panics on some structurally valid files (e.g. a page without /Resources).
    let outcome = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
    let text = match outcome {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            return Err(RagError::Extraction {
                filename: filename.to_string(),
                message: format!("error reading PDF: {e}"),
            });
        }
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            warn!(filename, %reason, "PDF parser crashed");
            return Err(RagError::Extraction {
                filename: filename.to_string(),
                message: format!("PDF parser crashed: {reason}"),
            });
        }
    };
    Ok(text.trim().to_string())
}

#[cfg(feature = "pdf")]
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_bytes: &[u8], filename: &str) -> Result<String> {
    Err(RagError::UnsupportedFormat { filename: filename.to_string(), extension: ".pdf".into() })
}

#[cfg(feature = "docx")]
fn extract_docx(bytes: &[u8], filename: &str) -> Result<String> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| RagError::Extraction {
        filename: filename.to_string(),
        message: format!("error reading DOCX: {e}"),
    })?;

    let mut paragraphs = Vec::new();
    for child in docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            let mut line = String::new();
            for child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            line.push_str(&t.text);
                        }
                    }
                }
            }
            paragraphs.push(line);
        }
    }

    Ok(paragraphs.join("\n").trim().to_string())
}

#[cfg(not(feature = "docx"))]
fn extract_docx(_bytes: &[u8], filename: &str) -> Result<String> {
    Err(RagError::UnsupportedFormat { filename: filename.to_string(), extension: ".docx".into() })
}
