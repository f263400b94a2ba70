//! Deterministic stand-ins for the remote embedding and generation backends.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docchat_rag::{
    ChatMessage, DocChat, EmbeddingProvider, GenerationProvider, RagConfig, RagError, TextExtractor,
};

/// Hash-based embeddings: identical texts map to identical unit vectors.
pub struct HashEmbedder {
    pub dimensions: usize,
    pub calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> docchat_rag::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Counts occurrences of a few marker letters, so texts sharing a letter are close.
pub struct LetterEmbedder;

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    async fn embed(&self, text: &str) -> docchat_rag::Result<Vec<f32>> {
        Ok(['A', 'B', 'C', 'D']
            .iter()
            .map(|letter| text.chars().filter(|c| c.eq_ignore_ascii_case(letter)).count() as f32)
            .collect())
    }

    fn dimensions(&self) -> usize {
        4
    }
}

/// Succeeds for the first `fail_at` calls, then fails every call.
pub struct FailingEmbedder {
    pub fail_at: usize,
    pub calls: AtomicUsize,
}

impl FailingEmbedder {
    pub fn new(fail_at: usize) -> Self {
        Self { fail_at, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> docchat_rag::Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.fail_at {
            return Err(RagError::EmbeddingFailure {
                provider: "failing".into(),
                index: None,
                message: "backend unavailable".into(),
            });
        }
        Ok(vec![1.0, 0.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        3
    }
}

/// Records every prompt and conversation and answers with a fixed reply.
pub struct RecordingGenerator {
    pub reply: String,
    pub prompts: Mutex<Vec<(String, String)>>,
    pub conversations: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
            conversations: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn conversations(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.conversations.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for RecordingGenerator {
    async fn generate(&self, model: &str, prompt: &str) -> docchat_rag::Result<String> {
        self.prompts.lock().unwrap().push((model.to_string(), prompt.to_string()));
        Ok(self.reply.clone())
    }

    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> docchat_rag::Result<String> {
        self.conversations.lock().unwrap().push((model.to_string(), messages.to_vec()));
        Ok(self.reply.clone())
    }

    async fn list_models(&self) -> docchat_rag::Result<Vec<String>> {
        Ok(vec!["llama3.2".to_string()])
    }
}

/// Always fails to generate.
pub struct BrokenGenerator;

#[async_trait]
impl GenerationProvider for BrokenGenerator {
    async fn generate(&self, model: &str, _prompt: &str) -> docchat_rag::Result<String> {
        Err(RagError::GenerationFailure {
            provider: "broken".into(),
            model: model.to_string(),
            message: "model not loaded".into(),
        })
    }
}

/// Returns the prompt it was given, so the default `chat` transcript is visible.
pub struct EchoGenerator;

#[async_trait]
impl GenerationProvider for EchoGenerator {
    async fn generate(&self, _model: &str, prompt: &str) -> docchat_rag::Result<String> {
        Ok(prompt.to_string())
    }
}

/// An extractor that crashes on every file.
pub struct PanickingExtractor;

impl TextExtractor for PanickingExtractor {
    fn extract(&self, _bytes: &[u8], filename: &str) -> docchat_rag::Result<String> {
        panic!("extractor bug while reading {filename}");
    }
}

/// A one-page PDF whose page has no `/Resources`; the PDF parser panics on it.
pub fn pdf_without_resources() -> Vec<u8> {
    let content = "BT /F1 12 Tf (Hello) Tj ET";
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>".to_string(),
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!("trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n", objects.len() + 1)
            .as_bytes(),
    );
    pdf
}

/// A `DocChat` with 4-character windows and no overlap.
pub fn small_chat(
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
) -> DocChat {
    let config = RagConfig::builder().chunk_size(4).chunk_overlap(0).top_k(3).build().unwrap();
    DocChat::builder()
        .config(config)
        .embedding_provider(embedder)
        .generation_provider(generator)
        .build()
        .unwrap()
}
