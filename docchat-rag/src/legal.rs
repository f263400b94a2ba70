//! General legal information chat, independent of any uploaded document.
//!
//! [`LegalAssistant`] prefixes every conversation with a fixed system prompt
//! and attaches [`LEGAL_DISCLAIMER`] to every reply.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::answer::{ChatMessage, GenerationProvider, Role};
use crate::error::{RagError, Result};

/// System prompt sent ahead of every legal conversation.
pub const LEGAL_SYSTEM_PROMPT: &str = "You are a helpful legal information assistant. You provide \
general legal information and guidance, but you are NOT a lawyer and do not provide official legal \
advice.

Important guidelines:
- Always remind users that this is general information, not legal advice
- Suggest consulting with a licensed attorney for specific legal matters
- Provide factual, balanced information about legal topics
- Cite general legal principles when relevant
- Be clear about jurisdictional differences when applicable
- Never guarantee legal outcomes

Always include a disclaimer in your responses when appropriate.";

/// Disclaimer returned alongside every legal reply.
pub const LEGAL_DISCLAIMER: &str = "This is general legal information, not legal advice. Please \
consult with a licensed attorney for specific legal matters.";

/// A model reply paired with the disclaimer shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegalReply {
    pub response: String,
    pub disclaimer: String,
}

/// Answers general legal questions with a fixed system prompt.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::{ChatMessage, LegalAssistant};
///
/// let legal = LegalAssistant::new(generator, "llama3.2");
/// let reply = legal.ask("Can my landlord keep my deposit?").await?;
///
/// let history = vec![
///     ChatMessage::user("What is a lease?"),
///     ChatMessage::assistant(reply.response),
///     ChatMessage::user("And a sublease?"),
/// ];
/// let follow_up = legal.ask_with_history(&history).await?;
/// ```
#[derive(Clone)]
pub struct LegalAssistant {
    generator: Arc<dyn GenerationProvider>,
    model: String,
    system_prompt: String,
}

impl LegalAssistant {
    pub fn new(generator: Arc<dyn GenerationProvider>, model: impl Into<String>) -> Self {
        Self { generator, model: model.into(), system_prompt: LEGAL_SYSTEM_PROMPT.to_string() }
    }

    /// Replace the default [`LEGAL_SYSTEM_PROMPT`].
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer a single message without prior context.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidConfig`] if the message is blank.
    /// - [`RagError::GenerationFailure`] if the model call fails.
    pub async fn ask(&self, message: &str) -> Result<LegalReply> {
        if message.trim().is_empty() {
            return Err(RagError::InvalidConfig("message is required".to_string()));
        }
        self.ask_with_history(&[ChatMessage::user(message)]).await
    }

    /// Answer the last turn of `history`, which is sent in order after the system prompt.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidConfig`] if `history` is empty or the model name is blank.
    /// - [`RagError::GenerationFailure`] if the model call fails.
    pub async fn ask_with_history(&self, history: &[ChatMessage]) -> Result<LegalReply> {
        if history.is_empty() {
            return Err(RagError::InvalidConfig("messages are required".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(RagError::InvalidConfig("generation model must not be empty".to_string()));
        }

        let mut conversation = Vec::with_capacity(history.len() + 1);
        conversation.push(ChatMessage::system(self.system_prompt.as_str()));
        conversation.extend_from_slice(history);

        let response = self.generator.chat(&self.model, &conversation).await.map_err(|e| {
            error!(model = %self.model, error = %e, "legal chat failed");
            e
        })?;

        let user_turns = history.iter().filter(|m| m.role == Role::User).count();
        info!(model = %self.model, turns = history.len(), user_turns, "answered legal question");
        Ok(LegalReply { response, disclaimer: LEGAL_DISCLAIMER.to_string() })
    }
}
