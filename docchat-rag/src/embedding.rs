//! Embedding capability and the batch [`Embedder`] built on top of it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a remote embedding backend behind a narrow async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially and
/// stops at the first failure, tagging the error with the failing position.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// Override this method if the backend supports native batch embedding.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for (index, text) in texts.iter().enumerate() {
            let embedding = self.embed(text).await.map_err(|e| tag_index(e, index))?;
            results.push(embedding);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Short provider name used in logs and errors.
    fn name(&self) -> &str {
        "embedding"
    }
}

/// Attach a batch position to an embedding failure that does not carry one yet.
pub(crate) fn tag_index(error: RagError, index: usize) -> RagError {
    match error {
        RagError::EmbeddingFailure { provider, index: None, message } => {
            RagError::EmbeddingFailure { provider, index: Some(index), message }
        }
        other => other,
    }
}

/// Maps batches of texts to equally long, same-ordered lists of vectors.
///
/// Validates inputs before any remote call and validates the provider's output
/// afterwards. A failure anywhere discards the whole batch.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl Embedder {
    /// Create an embedder backed by `provider`.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Embed every text in `texts`.
    ///
    /// An empty batch returns an empty list without contacting the provider.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidConfig`] if any text is empty or whitespace-only.
    /// - [`RagError::EmbeddingFailure`] if the provider fails, returns the wrong
    ///   number of vectors, or returns vectors of inconsistent dimension.
    pub async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(index) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(RagError::InvalidConfig(format!(
                "text at input {index} is empty; only non-empty texts can be embedded"
            )));
        }

        let provider = self.provider.name().to_string();
        debug!(provider = %provider, batch_size = texts.len(), "embedding batch");

        let vectors = self.provider.embed_batch(texts).await.map_err(|e| {
            error!(provider = %provider, error = %e, "embedding batch failed");
            e
        })?;

        if vectors.len() != texts.len() {
            return Err(RagError::EmbeddingFailure {
                provider,
                index: None,
                message: format!("expected {} embeddings, received {}", texts.len(), vectors.len()),
            });
        }

        let dimensions = vectors[0].len();
        if let Some(index) = vectors.iter().position(|v| v.is_empty() || v.len() != dimensions) {
            return Err(RagError::EmbeddingFailure {
                provider,
                index: Some(index),
                message: format!(
                    "embedding has {} dimensions, expected {dimensions} (and more than zero)",
                    vectors[index].len()
                ),
            });
        }

        Ok(vectors)
    }

    /// Embed a single text as a one-element batch.
    ///
    /// # Errors
    ///
    /// Same as [`Embedder::embed`].
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text]).await?;
        vectors.pop().ok_or_else(|| RagError::EmbeddingFailure {
            provider: self.provider.name().to_string(),
            index: Some(0),
            message: "provider returned no embedding".to_string(),
        })
    }
}
