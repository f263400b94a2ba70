//! Ollama backend for embeddings, chat generation and model listing.
//!
//! This module is only available when the `ollama` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::answer::{ChatMessage, GenerationProvider};
use crate::config::DEFAULT_GENERATION_MODEL;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const PROVIDER: &str = "Ollama";

/// The default Ollama server address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// The default model for Ollama embeddings.
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// The dimensionality of `nomic-embed-text`.
const DEFAULT_DIMENSIONS: usize = 768;

/// Connection and model settings for [`OllamaClient`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OllamaConfig {
    /// Server address, e.g. `http://localhost:11434`.
    pub base_url: String,
    /// Model used for embeddings.
    pub embedding_model: String,
    /// Vector size produced by `embedding_model`.
    pub dimensions: usize,
    /// Chat model used when callers do not name one.
    pub chat_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            chat_model: DEFAULT_GENERATION_MODEL.to_string(),
        }
    }
}

impl OllamaConfig {
    /// Defaults overridden by `OLLAMA_HOST`, `OLLAMA_EMBED_MODEL` and `OLLAMA_MODEL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            config.base_url = normalize_host(&host);
        }
        if let Ok(model) = std::env::var("OLLAMA_EMBED_MODEL") {
            config.embedding_model = model;
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            config.chat_model = model;
        }
        config
    }
}

/// Turn an `OLLAMA_HOST`-style address into a base URL.
///
/// The address is often given without a scheme (`127.0.0.1:11434`); `http://`
/// is assumed then. Trailing slashes are dropped.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

/// An [`EmbeddingProvider`] and [`GenerationProvider`] backed by an Ollama server.
///
/// Uses `reqwest` to call `/api/embeddings`, `/api/chat` and `/api/tags`.
/// Ollama has no batch embedding endpoint, so batches are embedded one text
/// at a time by the trait's default implementation.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::ollama::{OllamaClient, OllamaConfig};
///
/// let client = OllamaClient::new(OllamaConfig::default())?;
/// let embedding = client.embed("hello world").await?;
/// let answer = client.generate("llama3.2", "Say hello").await?;
/// ```
pub struct OllamaClient {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Create a new client for the given configuration.
    ///
    /// A base URL without a scheme is normalized with [`normalize_host`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] for an empty base URL or model name,
    /// or a zero dimension count.
    pub fn new(mut config: OllamaConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(RagError::InvalidConfig("Ollama base_url must not be empty".into()));
        }
        if config.embedding_model.trim().is_empty() {
            return Err(RagError::InvalidConfig("Ollama embedding_model must not be empty".into()));
        }
        if config.dimensions == 0 {
            return Err(RagError::InvalidConfig(
                "Ollama embedding dimensions must be greater than zero".into(),
            ));
        }
        config.base_url = normalize_host(&config.base_url);
        Ok(Self { client: reqwest::Client::new(), config })
    }

    /// Create a new client configured from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(OllamaConfig::from_env())
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Read an unsuccessful response into a readable message.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
    format!("API returned {status}: {detail}")
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), model = %self.config.embedding_model, "embedding text");

        let failure = |message: String| RagError::EmbeddingFailure {
            provider: PROVIDER.into(),
            index: None,
            message,
        };

        let request_body = EmbeddingRequest { model: &self.config.embedding_model, prompt: text };
        let response = self
            .client
            .post(self.url("/api/embeddings"))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "embedding request failed");
                failure(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(provider = PROVIDER, %message, "embedding API error");
            return Err(failure(message));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse embedding response");
            failure(format!("failed to parse response: {e}"))
        })?;

        Ok(body.embedding)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

// ── GenerationProvider implementation ──────────────────────────────

#[async_trait]
impl GenerationProvider for OllamaClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        self.chat(model, &[ChatMessage::user(prompt)]).await
    }

    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        debug!(provider = PROVIDER, model, message_count = messages.len(), "generating chat reply");

        let failure = |message: String| RagError::GenerationFailure {
            provider: PROVIDER.into(),
            model: model.to_string(),
            message,
        };

        let request_body = ChatRequest { model, messages, stream: false };
        let response =
            self.client.post(self.url("/api/chat")).json(&request_body).send().await.map_err(
                |e| {
                    error!(provider = PROVIDER, model, error = %e, "chat request failed");
                    failure(format!("request failed: {e}"))
                },
            )?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(provider = PROVIDER, model, %message, "chat API error");
            return Err(failure(message));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, model, error = %e, "failed to parse chat response");
            failure(format!("failed to parse response: {e}"))
        })?;

        Ok(body.message.content)
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let failure = |message: String| RagError::GenerationFailure {
            provider: PROVIDER.into(),
            model: "*".into(),
            message,
        };

        let response = self.client.get(self.url("/api/tags")).send().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "model listing failed");
            failure(format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(failure(error_detail(response).await));
        }

        let body: TagsResponse = response
            .json()
            .await
            .map_err(|e| failure(format!("failed to parse response: {e}")))?;
        Ok(body.models.into_iter().map(|m| m.name).collect())
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_without_scheme_gets_http() {
        assert_eq!(normalize_host("127.0.0.1:11434"), "http://127.0.0.1:11434");
        assert_eq!(normalize_host("https://ollama.internal/"), "https://ollama.internal");
    }

    #[test]
    fn chat_request_is_non_streaming_with_roles() {
        let messages = [ChatMessage::system("be brief"), ChatMessage::user("hi")];
        let body = ChatRequest { model: "llama3.2", messages: &messages, stream: false };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "llama3.2",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ],
                "stream": false
            })
        );
    }

    #[test]
    fn client_normalizes_scheme_less_base_url() {
        let config = OllamaConfig { base_url: "127.0.0.1:11434/".into(), ..OllamaConfig::default() };
        let client = OllamaClient::new(config).unwrap();
        assert_eq!(client.config().base_url, "http://127.0.0.1:11434");
        assert_eq!(client.url("/api/tags"), "http://127.0.0.1:11434/api/tags");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let config = OllamaConfig { base_url: String::new(), ..OllamaConfig::default() };
        assert!(matches!(OllamaClient::new(config), Err(RagError::InvalidConfig(_))));
    }
}
