//! Question-to-excerpts retrieval against a single document.

use std::sync::Arc;

use tracing::{debug, error};

use crate::config::{DEFAULT_TOP_K, validate_top_k};
use crate::document::{DocumentId, RetrievedChunk};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Embeds a question and returns the nearest chunks of one document.
#[derive(Clone)]
pub struct Retriever {
    embedder: Embedder,
    vector_store: Arc<dyn VectorStore>,
    default_k: usize,
}

impl Retriever {
    /// Create a retriever returning [`DEFAULT_TOP_K`] chunks unless overridden.
    pub fn new(embedder: Embedder, vector_store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, vector_store, default_k: DEFAULT_TOP_K }
    }

    /// Change the number of chunks returned by [`Retriever::retrieve`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if `k` is zero.
    pub fn with_default_k(mut self, k: usize) -> Result<Self> {
        validate_top_k(k)?;
        self.default_k = k;
        Ok(self)
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    /// Retrieve the default number of chunks nearest to `question`.
    ///
    /// # Errors
    ///
    /// See [`Retriever::retrieve_top_k`].
    pub async fn retrieve(
        &self,
        document_id: &DocumentId,
        question: &str,
    ) -> Result<Vec<RetrievedChunk>> {
        self.retrieve_top_k(document_id, question, self.default_k).await
    }

    /// Retrieve up to `k` chunks nearest to `question`, most similar first.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidConfig`] if `k` is zero or the question is blank.
    /// - [`RagError::NotFound`] if the document has no collection.
    /// - [`RagError::EmbeddingFailure`] if the question cannot be embedded.
    pub async fn retrieve_top_k(
        &self,
        document_id: &DocumentId,
        question: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        validate_top_k(k)?;
        if question.trim().is_empty() {
            return Err(RagError::InvalidConfig("question must not be empty".to_string()));
        }

        // Skip the remote call when the document is unknown.
        if !self.vector_store.contains(document_id).await? {
            return Err(RagError::NotFound {
                document_id: document_id.to_string(),
                operation: "retrieve",
            });
        }

        let query_embedding = self.embedder.embed_one(question).await.map_err(|e| {
            error!(document.id = %document_id, error = %e, "question embedding failed");
            e
        })?;

        let results = self.vector_store.query(document_id, &query_embedding, k).await.map_err(|e| {
            error!(document.id = %document_id, error = %e, "vector store query failed");
            e
        })?;

        debug!(document.id = %document_id, k, result_count = results.len(), "retrieved chunks");
        Ok(results)
    }
}
