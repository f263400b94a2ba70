//! Data types for documents, chunks, and retrieval results.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of characters kept in [`Document::preview`].
pub const PREVIEW_CHARS: usize = 500;

/// Opaque identifier of an ingested document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An ingested document as seen by its owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: DocumentId,
    /// Identity of the user that uploaded the document.
    pub owner: String,
    /// Original file name.
    pub filename: String,
    /// Number of chunks indexed for retrieval.
    pub chunk_count: usize,
    /// Length of the extracted text in characters.
    pub text_length: usize,
    /// Leading excerpt of the extracted text.
    pub preview: String,
    /// When ingestion completed.
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub(crate) fn new(
        id: DocumentId,
        owner: impl Into<String>,
        filename: impl Into<String>,
        text: &str,
        chunk_count: usize,
    ) -> Self {
        Self {
            id,
            owner: owner.into(),
            filename: filename.into(),
            chunk_count,
            text_length: text.chars().count(),
            preview: preview(text),
            created_at: Utc::now(),
        }
    }
}

/// First [`PREVIEW_CHARS`] characters of `text`, with `...` appended when cut short.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// A window of document text produced by the chunker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Sequential id within the document, starting at zero.
    pub id: usize,
    /// The text content of the chunk.
    pub text: String,
    /// Character offset of the first character (inclusive).
    pub start_char: usize,
    /// Character offset one past the last character (exclusive).
    pub end_char: usize,
}

/// Metadata stored alongside every indexed chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub start_char: usize,
    pub end_char: usize,
    /// Original file name of the parent document.
    pub filename: String,
}

/// A [`Chunk`] paired with its embedding, staged for a single vector-store commit.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A chunk returned by nearest-neighbor retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    /// Id of the chunk within its document.
    pub chunk_id: usize,
    /// The chunk text.
    pub text: String,
    /// Offsets and source file name.
    pub metadata: ChunkMetadata,
    /// Distance to the query vector (lower is more similar).
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_text_on_char_boundary() {
        let text = "é".repeat(PREVIEW_CHARS + 10);
        let p = preview(&text);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn preview_keeps_short_text() {
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(DocumentId::generate(), DocumentId::generate());
    }
}
