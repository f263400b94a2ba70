//! Configuration for the document pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::inmemory::DistanceMetric;

/// Default number of excerpts handed to the generation model.
pub const DEFAULT_TOP_K: usize = 3;

/// Default generation model, matching what the Ollama backend ships with.
pub const DEFAULT_GENERATION_MODEL: &str = "llama3.2";

/// Configuration parameters for ingestion and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of nearest chunks retrieved per question when the caller does not override it.
    pub top_k: usize,
    /// Distance metric used by the vector store.
    pub metric: DistanceMetric,
    /// Generation model used when the caller does not name one.
    pub generation_model: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: DEFAULT_TOP_K,
            metric: DistanceMetric::default(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the chunking and retrieval parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    pub fn validate(&self) -> Result<()> {
        validate_chunking(self.chunk_size, self.chunk_overlap)?;
        validate_top_k(self.top_k)?;
        if self.generation_model.trim().is_empty() {
            return Err(RagError::InvalidConfig("generation_model must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Reject window parameters that would produce a non-positive step.
pub(crate) fn validate_chunking(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::InvalidConfig("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::InvalidConfig(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

pub(crate) fn validate_top_k(top_k: usize) -> Result<()> {
    if top_k == 0 {
        return Err(RagError::InvalidConfig("top_k must be greater than zero".to_string()));
    }
    Ok(())
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the chunk window size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the default number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the vector distance metric.
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Set the default generation model.
    pub fn generation_model(mut self, model: impl Into<String>) -> Self {
        self.config.generation_model = model.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] when [`RagConfig::validate`] fails.
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RagConfig::default().validate().is_ok());
        assert_eq!(RagConfig::default().top_k, 3);
    }

    #[test]
    fn overlap_equal_to_size_is_rejected() {
        let err = RagConfig::builder().chunk_size(4).chunk_overlap(4).build().unwrap_err();
        assert!(matches!(err, RagError::InvalidConfig(_)));
    }

    #[test]
    fn zero_chunk_size_and_zero_top_k_are_rejected() {
        assert!(RagConfig::builder().chunk_size(0).chunk_overlap(0).build().is_err());
        assert!(RagConfig::builder().top_k(0).build().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = RagConfig::builder()
            .chunk_size(4)
            .chunk_overlap(1)
            .metric(DistanceMetric::Euclidean)
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"euclidean\""));
        let back: RagConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
