//! Vector store trait for per-document collections of embedded chunks.

use async_trait::async_trait;

use crate::document::{DocumentId, EmbeddedChunk, RetrievedChunk};
use crate::error::Result;

/// A storage backend holding one isolated collection per document.
///
/// Collections are write-once: they are created whole from a staged batch,
/// queried, and finally deleted. A query against one document never sees
/// chunks of another.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create(&doc_id, staged_chunks, "contract.pdf").await?;
/// let nearest = store.query(&doc_id, &query_embedding, 3).await?;
/// store.delete(&doc_id).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection for `document_id` from a fully embedded batch.
    ///
    /// Fails with [`RagError::AlreadyExists`](crate::RagError::AlreadyExists)
    /// if the document already has a collection.
    async fn create(
        &self,
        document_id: &DocumentId,
        chunks: Vec<EmbeddedChunk>,
        filename: &str,
    ) -> Result<()>;

    /// Return up to `k` chunks nearest to `embedding`, ordered by ascending
    /// distance with ties broken by ascending chunk id.
    ///
    /// Fails with [`RagError::NotFound`](crate::RagError::NotFound) if the
    /// document has no collection.
    async fn query(
        &self,
        document_id: &DocumentId,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>>;

    /// Remove the collection for `document_id`. Removing a missing collection is a no-op.
    async fn delete(&self, document_id: &DocumentId) -> Result<()>;

    /// Whether a collection exists for `document_id`.
    async fn contains(&self, document_id: &DocumentId) -> Result<bool>;
}
