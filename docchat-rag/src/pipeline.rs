//! Document chat orchestrator.
//!
//! [`DocChat`] coordinates ingestion (extract → chunk → embed → store) and
//! question answering (embed → search → prompt → generate), and keeps a
//! registry of ingested documents and their owners.
//!
//! # Example
//!
//! ```rust,ignore
//! use docchat_rag::{DocChat, DocumentId, RagConfig};
//!
//! let chat = DocChat::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .generation_provider(Arc::new(my_generator))
//!     .build()?;
//!
//! let doc = chat.upload("alice", "lease.pdf", &bytes).await?;
//! let answer = chat.ask(&doc.id, "When is rent due?", 3, "llama3.2").await?;
//! chat.remove(&doc.id).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info};

use crate::answer::{Answerer, GenerationProvider};
use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::document::{Document, DocumentId, EmbeddedChunk};
use crate::embedding::{Embedder, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::extract::{DefaultTextExtractor, TextExtractor};
use crate::inmemory::InMemoryVectorStore;
use crate::legal::LegalAssistant;
use crate::retrieval::Retriever;
use crate::vectorstore::VectorStore;

/// The document chat orchestrator.
///
/// Construct one via [`DocChat::builder()`]. All methods take `&self`, so a
/// single instance can be shared across request handlers behind an `Arc`.
/// Ingestion and removal of the *same* document id must be serialized by the
/// caller.
pub struct DocChat {
    config: RagConfig,
    chunker: Arc<dyn Chunker>,
    embedder: Embedder,
    vector_store: Arc<dyn VectorStore>,
    answerer: Answerer,
    extractor: Arc<dyn TextExtractor>,
    documents: RwLock<HashMap<DocumentId, Document>>,
}

impl DocChat {
    /// Create a new [`DocChatBuilder`].
    pub fn builder() -> DocChatBuilder {
        DocChatBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Index `raw_text` under `document_id` and return the number of chunks stored.
    ///
    /// Chunks are embedded into a staging buffer that is committed to the
    /// vector store only once every embedding has succeeded. Empty text is
    /// indexed as an empty collection.
    ///
    /// Only the vector store is written: no [`Document`] is registered, so
    /// [`DocChat::document`] returns `None` for this id. Use
    /// [`DocChat::ingest_owned`] or [`DocChat::upload`] to register one.
    ///
    /// # Errors
    ///
    /// - [`RagError::AlreadyExists`] if the document was already ingested.
    /// - [`RagError::EmbeddingFailure`] if any chunk fails to embed; nothing is stored.
    pub async fn ingest(
        &self,
        document_id: &DocumentId,
        raw_text: &str,
        filename: &str,
    ) -> Result<usize> {
        if self.vector_store.contains(document_id).await? {
            error!(document.id = %document_id, "document already ingested");
            return Err(RagError::AlreadyExists { document_id: document_id.to_string() });
        }

        // 1. Chunk the text
        let chunks = self.chunker.chunk(raw_text);

        // 2. Embed every chunk into the staging buffer
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed(&texts).await.map_err(|e| {
            error!(document.id = %document_id, error = %e, "embedding failed during ingestion");
            e
        })?;
        let staged: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
            .collect();
        let chunk_count = staged.len();

        // 3. Commit the whole collection at once
        self.vector_store.create(document_id, staged, filename).await.map_err(|e| {
            error!(document.id = %document_id, error = %e, "collection commit failed");
            e
        })?;

        info!(document.id = %document_id, filename, chunk_count, "ingested document");
        Ok(chunk_count)
    }

    /// Ingest `raw_text` and register it as a document owned by `owner`.
    ///
    /// # Errors
    ///
    /// Same as [`DocChat::ingest`].
    pub async fn ingest_owned(
        &self,
        owner: &str,
        document_id: DocumentId,
        raw_text: &str,
        filename: &str,
    ) -> Result<Document> {
        let chunk_count = self.ingest(&document_id, raw_text, filename).await?;
        let document = Document::new(document_id, owner, filename, raw_text, chunk_count);
        self.documents.write().await.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    /// Extract text from an uploaded file and ingest it under a freshly generated id.
    ///
    /// # Errors
    ///
    /// - [`RagError::UnsupportedFormat`] / [`RagError::Extraction`] from text extraction,
    ///   including a file that yields no text.
    /// - Any error of [`DocChat::ingest`].
    pub async fn upload(&self, owner: &str, filename: &str, bytes: &[u8]) -> Result<Document> {
        let text = self.extract(bytes, filename).await.map_err(|e| {
            error!(filename, error = %e, "text extraction failed");
            e
        })?;
        if text.trim().is_empty() {
            return Err(RagError::Extraction {
                filename: filename.to_string(),
                message: "no text could be extracted from file".to_string(),
            });
        }

        self.ingest_owned(owner, DocumentId::generate(), &text, filename).await
    }

    /// Run the extractor on the blocking pool; parsing is CPU-bound and may panic.
    async fn extract(&self, bytes: &[u8], filename: &str) -> Result<String> {
        let extractor = Arc::clone(&self.extractor);
        let owned_bytes = bytes.to_vec();
        let owned_name = filename.to_string();
        tokio::task::spawn_blocking(move || extractor.extract(&owned_bytes, &owned_name))
            .await
            .map_err(|e| RagError::Extraction {
                filename: filename.to_string(),
                message: format!("extractor crashed: {e}"),
            })?
    }

    /// Answer `question` about a document from its `k` nearest chunks using `model`.
    ///
    /// # Errors
    ///
    /// - [`RagError::NotFound`] if the document is unknown.
    /// - [`RagError::InvalidConfig`] for a zero `k`, a blank question, or a blank model.
    /// - [`RagError::EmbeddingFailure`] / [`RagError::GenerationFailure`] from remote calls.
    pub async fn ask(
        &self,
        document_id: &DocumentId,
        question: &str,
        k: usize,
        model: &str,
    ) -> Result<String> {
        self.answerer.answer_top_k(document_id, question, k, model).await.map_err(|e| {
            error!(document.id = %document_id, operation = "ask", error = %e, "question failed");
            e
        })
    }

    /// [`DocChat::ask`] with the configured `top_k` and generation model.
    ///
    /// # Errors
    ///
    /// Same as [`DocChat::ask`].
    pub async fn ask_with_defaults(&self, document_id: &DocumentId, question: &str) -> Result<String> {
        self.ask(document_id, question, self.config.top_k, &self.config.generation_model).await
    }

    /// Delete a document and its collection. Removing an unknown document is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates vector store failures.
    pub async fn remove(&self, document_id: &DocumentId) -> Result<()> {
        self.vector_store.delete(document_id).await?;
        let removed = self.documents.write().await.remove(document_id).is_some();
        info!(document.id = %document_id, registered = removed, "removed document");
        Ok(())
    }

    /// Look up a registered document by id.
    pub async fn document(&self, document_id: &DocumentId) -> Option<Document> {
        self.documents.read().await.get(document_id).cloned()
    }

    /// Look up a document on behalf of `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`] if the document does not exist or belongs
    /// to someone else; the two cases are indistinguishable to the caller.
    pub async fn document_for(&self, owner: &str, document_id: &DocumentId) -> Result<Document> {
        self.document(document_id).await.filter(|doc| doc.owner == owner).ok_or_else(|| {
            RagError::NotFound { document_id: document_id.to_string(), operation: "document" }
        })
    }

    /// All documents registered for `owner`, oldest first.
    pub async fn documents_for(&self, owner: &str) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .documents
            .read()
            .await
            .values()
            .filter(|doc| doc.owner == owner)
            .cloned()
            .collect();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        docs
    }

    /// A [`LegalAssistant`] on this pipeline's generation backend and default model.
    pub fn legal_assistant(&self) -> LegalAssistant {
        LegalAssistant::new(Arc::clone(self.answerer.generator()), &self.config.generation_model)
    }

    /// Names of the models offered by the generation backend.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::GenerationFailure`] if the backend cannot be reached.
    pub async fn models(&self) -> Result<Vec<String>> {
        self.answerer.generator().list_models().await
    }
}

/// Builder for constructing a [`DocChat`].
///
/// The embedding and generation providers are required. The vector store
/// defaults to an [`InMemoryVectorStore`] using the configured metric, the
/// chunker to a [`FixedSizeChunker`] using the configured window, and the
/// extractor to [`DefaultTextExtractor`].
#[derive(Default)]
pub struct DocChatBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generation_provider: Option<Arc<dyn GenerationProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    extractor: Option<Arc<dyn TextExtractor>>,
}

impl DocChatBuilder {
    /// Set the pipeline configuration. Defaults to [`RagConfig::default`].
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generation provider.
    pub fn generation_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generation_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the text extractor used by [`DocChat::upload`].
    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Build the [`DocChat`], validating the configuration and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if a provider is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<DocChat> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedding_provider = self.embedding_provider.ok_or_else(|| {
            RagError::InvalidConfig("embedding_provider is required".to_string())
        })?;
        let generation_provider = self.generation_provider.ok_or_else(|| {
            RagError::InvalidConfig("generation_provider is required".to_string())
        })?;

        let chunker: Arc<dyn Chunker> = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)?),
        };
        let vector_store = self
            .vector_store
            .unwrap_or_else(|| Arc::new(InMemoryVectorStore::with_metric(config.metric)));
        let extractor = self.extractor.unwrap_or_else(|| Arc::new(DefaultTextExtractor));

        let embedder = Embedder::new(embedding_provider);
        let retriever = Retriever::new(embedder.clone(), Arc::clone(&vector_store))
            .with_default_k(config.top_k)?;
        let answerer = Answerer::new(retriever, generation_provider);

        Ok(DocChat {
            config,
            chunker,
            embedder,
            vector_store,
            answerer,
            extractor,
            documents: RwLock::default(),
        })
    }
}
