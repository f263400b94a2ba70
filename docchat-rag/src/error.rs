//! Error types for the `docchat-rag` crate.

use thiserror::Error;

/// Errors that can occur while indexing documents or answering questions.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid chunking, retrieval or input parameters.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The file extension has no text extractor.
    #[error("Unsupported file format '{extension}' for '{filename}'")]
    UnsupportedFormat {
        /// The uploaded file name.
        filename: String,
        /// The lowercased extension, including the leading dot (empty if none).
        extension: String,
    },

    /// A supported file could not be turned into text.
    #[error("Text extraction failed for '{filename}': {message}")]
    Extraction {
        /// The uploaded file name.
        filename: String,
        /// A description of the failure.
        message: String,
    },

    /// An embedding call failed.
    #[error("Embedding failure ({provider}){}: {message}", at_input(.index))]
    EmbeddingFailure {
        /// The embedding provider that produced the error.
        provider: String,
        /// Position of the failing text within the batch, when known.
        index: Option<usize>,
        /// A description of the failure.
        message: String,
    },

    /// A generation call failed.
    #[error("Generation failure ({provider}, model '{model}'): {message}")]
    GenerationFailure {
        /// The generation provider that produced the error.
        provider: String,
        /// The requested model.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// No collection exists for the document.
    #[error("Document '{document_id}' not found during {operation}")]
    NotFound {
        /// The requested document id.
        document_id: String,
        /// The operation that looked the document up.
        operation: &'static str,
    },

    /// The document has already been ingested.
    #[error("Document '{document_id}' already exists")]
    AlreadyExists {
        /// The duplicated document id.
        document_id: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },
}

fn at_input(index: &Option<usize>) -> String {
    index.map(|i| format!(" at input {i}")).unwrap_or_default()
}

impl RagError {
    /// Whether the caller may reasonably retry the same request.
    ///
    /// Only remote-call failures qualify; nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EmbeddingFailure { .. } | Self::GenerationFailure { .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
