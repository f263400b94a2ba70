//! # docchat-rag
//!
//! Per-document retrieval-augmented question answering.
//!
//! An uploaded document is split into overlapping character windows, each
//! window is embedded, and the embeddings are stored in a collection that
//! belongs to that document alone. A question is embedded, matched against the
//! document's collection by vector distance, and the nearest excerpts are
//! assembled into a single grounded prompt for a generation model.
//!
//! ## Components
//!
//! - [`FixedSizeChunker`] — deterministic overlapping windows with character offsets
//! - [`Embedder`] — batch embedding over an [`EmbeddingProvider`]
//! - [`InMemoryVectorStore`] — one isolated [`VectorStore`] collection per document
//! - [`Retriever`] — question → nearest chunks
//! - [`Answerer`] — nearest chunks → prompt → [`GenerationProvider`]
//! - [`DocChat`] — upload, ingest, ask and remove in one place
//! - [`LegalAssistant`] — general legal information chat with a fixed system prompt
//!
//! ## Features
//!
//! - `pdf` / `docx` — text extraction for those formats (default)
//! - `ollama` — [`ollama::OllamaClient`] embedding and generation backend (default)

pub mod answer;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod inmemory;
pub mod legal;
#[cfg(feature = "ollama")]
pub mod ollama;
pub mod pipeline;
pub mod retrieval;
pub mod vectorstore;

pub use answer::{Answerer, ChatMessage, EXCERPT_SEPARATOR, GenerationProvider, PromptBuilder, Role};
pub use chunking::{Chunker, FixedSizeChunker, chunk_text};
pub use config::{DEFAULT_GENERATION_MODEL, DEFAULT_TOP_K, RagConfig, RagConfigBuilder};
pub use document::{Chunk, ChunkMetadata, Document, DocumentId, EmbeddedChunk, RetrievedChunk};
pub use embedding::{Embedder, EmbeddingProvider};
pub use error::{RagError, Result};
pub use extract::{DefaultTextExtractor, FileFormat, TextExtractor, extract_text};
pub use inmemory::{DistanceMetric, InMemoryVectorStore};
pub use legal::{LEGAL_DISCLAIMER, LEGAL_SYSTEM_PROMPT, LegalAssistant, LegalReply};
pub use pipeline::{DocChat, DocChatBuilder};
pub use retrieval::Retriever;
pub use vectorstore::VectorStore;
