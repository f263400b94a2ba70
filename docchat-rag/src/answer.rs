//! Prompt assembly and answer generation over retrieved excerpts.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::document::{DocumentId, RetrievedChunk};
use crate::error::{RagError, Result};
use crate::retrieval::Retriever;

/// Separator placed between excerpts in the prompt.
pub const EXCERPT_SEPARATOR: &str = "\n\n---\n\n";

/// Author of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation sent to [`GenerationProvider::chat`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A provider that turns a prompt into a text completion.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::GenerationProvider;
///
/// let text = provider.generate("llama3.2", "Say hello").await?;
/// ```
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for `prompt` with `model`.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;

    /// Generate a reply to a role-tagged conversation with `model`.
    ///
    /// The default implementation flattens the conversation into a single
    /// `role: content` transcript and calls [`generate`](GenerationProvider::generate).
    /// Override this method if the backend accepts structured messages.
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let transcript = messages
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        self.generate(model, &transcript).await
    }

    /// Names of the models this provider can serve.
    ///
    /// The default implementation reports none.
    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Short provider name used in logs and errors.
    fn name(&self) -> &str {
        "generation"
    }
}

/// Builds the single prompt sent to the generation model.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build a grounded prompt from `excerpts`, most relevant first.
    ///
    /// With no excerpts the prompt states that no document context is
    /// available and asks the model to say it cannot answer from the document.
    pub fn build(question: &str, excerpts: &[RetrievedChunk]) -> String {
        if excerpts.is_empty() {
            return Self::build_without_context(question);
        }

        let joined =
            excerpts.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(EXCERPT_SEPARATOR);

        format!(
            "You are a helpful assistant that answers questions about a document using only \
the excerpts below.\n\
If the excerpts do not contain enough information to answer, say that the document does not \
provide enough information. Do not make up facts.\n\n\
Document excerpts:\n{joined}\n\n\
Question: {question}\n\n\
Answer clearly and concisely based only on the excerpts above."
        )
    }

    /// Prompt used when retrieval returned nothing.
    pub fn build_without_context(question: &str) -> String {
        format!(
            "You are a helpful assistant that answers questions about a document.\n\
No document context is available: the document contains no indexed text.\n\
Tell the user that the document does not provide enough information to answer the question. \
Do not answer from general knowledge.\n\n\
Question: {question}"
        )
    }
}

/// Answers questions about one document with a single generation call.
#[derive(Clone)]
pub struct Answerer {
    retriever: Retriever,
    generator: Arc<dyn GenerationProvider>,
}

impl Answerer {
    pub fn new(retriever: Retriever, generator: Arc<dyn GenerationProvider>) -> Self {
        Self { retriever, generator }
    }

    pub fn generator(&self) -> &Arc<dyn GenerationProvider> {
        &self.generator
    }

    /// Answer `question` using the retriever's default `k`.
    ///
    /// # Errors
    ///
    /// See [`Answerer::answer_top_k`].
    pub async fn answer(
        &self,
        document_id: &DocumentId,
        question: &str,
        model: &str,
    ) -> Result<String> {
        self.answer_top_k(document_id, question, self.retriever.default_k(), model).await
    }

    /// Retrieve up to `k` excerpts, build the prompt, and return the model output verbatim.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidConfig`] for a zero `k`, a blank question, or a blank model name.
    /// - [`RagError::NotFound`] if the document is unknown.
    /// - [`RagError::EmbeddingFailure`] / [`RagError::GenerationFailure`] from the remote calls.
    pub async fn answer_top_k(
        &self,
        document_id: &DocumentId,
        question: &str,
        k: usize,
        model: &str,
    ) -> Result<String> {
        if model.trim().is_empty() {
            return Err(RagError::InvalidConfig("generation model must not be empty".to_string()));
        }

        let excerpts = self.retriever.retrieve_top_k(document_id, question, k).await?;
        if excerpts.is_empty() {
            warn!(document.id = %document_id, "no excerpts retrieved, asking without context");
        }

        let prompt = PromptBuilder::build(question, &excerpts);
        let answer = self.generator.generate(model, &prompt).await.map_err(|e| {
            error!(document.id = %document_id, model, error = %e, "generation failed");
            e
        })?;

        info!(
            document.id = %document_id,
            model,
            excerpt_count = excerpts.len(),
            answer_len = answer.len(),
            "answered question"
        );
        Ok(answer)
    }
}
