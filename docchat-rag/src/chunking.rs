//! Document chunking.
//!
//! [`FixedSizeChunker`] slides a fixed-size character window over the text,
//! stepping by `chunk_size - chunk_overlap`. Offsets are counted in characters,
//! so multi-byte text is never split inside a code point.

use crate::config::validate_chunking;
use crate::document::Chunk;
use crate::error::Result;

/// A strategy for splitting document text into chunks.
///
/// Implementations must be deterministic: the same text always yields the same
/// chunk sequence. Returns an empty `Vec` for empty text.
pub trait Chunker: Send + Sync {
    /// Split text into chunks, numbered from zero in emission order.
    fn chunk(&self, text: &str) -> Vec<Chunk>;
}

/// Splits text into fixed-size windows by character count with configurable overlap.
///
/// Windows whose trimmed content is empty are skipped without consuming an id.
/// Scanning stops once a window reaches the end of the text.
///
/// # Example
///
/// ```rust
/// use docchat_rag::{Chunker, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(4, 0).unwrap();
/// let chunks = chunker.chunk("AAAABBBBCCCC");
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(chunks[1].text, "BBBB");
/// assert_eq!((chunks[1].start_char, chunks[1].end_char), (4, 8));
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — number of characters per window
    /// * `chunk_overlap` — number of characters shared by consecutive windows
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`](crate::RagError::InvalidConfig) if
    /// `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every character, plus the end of the string.
        let boundaries: Vec<usize> =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let char_len = boundaries.len() - 1;
        let step = self.chunk_size - self.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < char_len {
            let end = (start + self.chunk_size).min(char_len);
            let window = &text[boundaries[start]..boundaries[end]];

            if !window.trim().is_empty() {
                chunks.push(Chunk {
                    id: chunks.len(),
                    text: window.to_string(),
                    start_char: start,
                    end_char: end,
                });
            }

            if end == char_len {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// Chunk `text` with a one-off [`FixedSizeChunker`].
///
/// # Errors
///
/// Returns [`RagError::InvalidConfig`](crate::RagError::InvalidConfig) for a
/// zero `chunk_size` or an overlap that is not smaller than it.
pub fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<Chunk>> {
    Ok(FixedSizeChunker::new(chunk_size, chunk_overlap)?.chunk(text))
}
