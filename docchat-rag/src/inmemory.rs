//! In-memory vector store with one collection per document.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` from document id to collection, protected by a
//! `tokio::sync::RwLock`. Search is exhaustive, which is adequate for the
//! chunk counts of a single uploaded document.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{ChunkMetadata, DocumentId, EmbeddedChunk, RetrievedChunk};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "InMemory";

/// Dissimilarity measure between two embeddings; smaller is more similar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cosine_similarity`, in `[0, 2]`.
    #[default]
    Cosine,
    /// Straight-line (L2) distance.
    Euclidean,
}

impl DistanceMetric {
    /// Compute the distance between `a` and `b` under this metric.
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => 1.0 - cosine_similarity(a, b),
            Self::Euclidean => {
                a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
            }
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[derive(Debug)]
struct StoredChunk {
    chunk_id: usize,
    text: String,
    metadata: ChunkMetadata,
    embedding: Vec<f32>,
}

/// The isolated index of a single document.
#[derive(Debug)]
struct Collection {
    /// `None` for a document that produced no chunks.
    dimensions: Option<usize>,
    chunks: Vec<StoredChunk>,
}

impl Collection {
    fn build(document_id: &DocumentId, staged: Vec<EmbeddedChunk>, filename: &str) -> Result<Self> {
        let dimensions = staged.first().map(|c| c.embedding.len());
        if let Some(dims) = dimensions {
            if let Some(bad) = staged.iter().find(|c| c.embedding.len() != dims) {
                return Err(RagError::VectorStoreError {
                    backend: BACKEND.to_string(),
                    message: format!(
                        "chunk {} of document '{document_id}' has {} dimensions, expected {dims}",
                        bad.chunk.id,
                        bad.embedding.len()
                    ),
                });
            }
        }

        let chunks = staged
            .into_iter()
            .map(|EmbeddedChunk { chunk, embedding }| StoredChunk {
                chunk_id: chunk.id,
                metadata: ChunkMetadata {
                    start_char: chunk.start_char,
                    end_char: chunk.end_char,
                    filename: filename.to_string(),
                },
                text: chunk.text,
                embedding,
            })
            .collect();

        Ok(Self { dimensions, chunks })
    }
}

/// An in-memory vector store keyed by document id.
///
/// All operations are async-safe via `tokio::sync::RwLock`. A collection is
/// inserted in one step under the write lock, so readers never observe a
/// partially built collection.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::{DistanceMetric, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::with_metric(DistanceMetric::Euclidean);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    metric: DistanceMetric,
    collections: RwLock<HashMap<DocumentId, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty store using cosine distance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty store using `metric` for every query.
    pub fn with_metric(metric: DistanceMetric) -> Self {
        Self { metric, collections: RwLock::default() }
    }

    /// Number of documents currently indexed.
    pub async fn len(&self) -> usize {
        self.collections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.collections.read().await.is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create(
        &self,
        document_id: &DocumentId,
        chunks: Vec<EmbeddedChunk>,
        filename: &str,
    ) -> Result<()> {
        let collection = Collection::build(document_id, chunks, filename)?;
        let chunk_count = collection.chunks.len();

        let mut collections = self.collections.write().await;
        match collections.entry(document_id.clone()) {
            Entry::Occupied(_) => {
                Err(RagError::AlreadyExists { document_id: document_id.to_string() })
            }
            Entry::Vacant(slot) => {
                slot.insert(collection);
                debug!(document.id = %document_id, chunk_count, "collection created");
                Ok(())
            }
        }
    }

    async fn query(
        &self,
        document_id: &DocumentId,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let collections = self.collections.read().await;
        let collection = collections.get(document_id).ok_or_else(|| RagError::NotFound {
            document_id: document_id.to_string(),
            operation: "query",
        })?;

        if let Some(dims) = collection.dimensions {
            if dims != embedding.len() {
                return Err(RagError::VectorStoreError {
                    backend: BACKEND.to_string(),
                    message: format!(
                        "query has {} dimensions but document '{document_id}' was indexed with {dims}",
                        embedding.len()
                    ),
                });
            }
        }

        let mut scored: Vec<RetrievedChunk> = collection
            .chunks
            .iter()
            .map(|stored| RetrievedChunk {
                chunk_id: stored.chunk_id,
                text: stored.text.clone(),
                metadata: stored.metadata.clone(),
                distance: self.metric.distance(&stored.embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| match a.distance.total_cmp(&b.distance) {
            Ordering::Equal => a.chunk_id.cmp(&b.chunk_id),
            ordering => ordering,
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn delete(&self, document_id: &DocumentId) -> Result<()> {
        let mut collections = self.collections.write().await;
        if collections.remove(document_id).is_some() {
            debug!(document.id = %document_id, "collection deleted");
        }
        Ok(())
    }

    async fn contains(&self, document_id: &DocumentId) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(document_id))
    }
}
