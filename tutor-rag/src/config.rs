//! Configuration for ingestion and search.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the RAG pipelines.
///
/// Every field has a default, so a partial TOML or JSON document
/// deserializes into a complete config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Maximum number of texts sent to the embedding provider in one request.
    pub embedding_batch_size: usize,
    /// Pause between embedding sub-batches, in milliseconds.
    pub embedding_batch_delay_ms: u64,
    /// Maximum number of chunks inserted into the vector store per request.
    pub store_batch_size: usize,
    /// Minimum similarity for a chunk to be returned by a search.
    pub match_threshold: f32,
    /// Maximum number of chunks returned by a search.
    pub match_count: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            embedding_batch_size: 100,
            embedding_batch_delay_ms: 100,
            store_batch_size: 100,
            match_threshold: 0.7,
            match_count: 5,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// The pause between embedding sub-batches.
    pub fn embedding_batch_delay(&self) -> Duration {
        Duration::from_millis(self.embedding_batch_delay_ms)
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - either batch size is zero
    /// - `match_count == 0`
    /// - `match_threshold` is outside `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.embedding_batch_size == 0 {
            return Err(RagError::ConfigError(
                "embedding_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.store_batch_size == 0 {
            return Err(RagError::ConfigError(
                "store_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.match_count == 0 {
            return Err(RagError::ConfigError("match_count must be greater than zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(RagError::ConfigError(format!(
                "match_threshold ({}) must be within [0, 1]",
                self.match_threshold
            )));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the embedding sub-batch size.
    pub fn embedding_batch_size(mut self, size: usize) -> Self {
        self.config.embedding_batch_size = size;
        self
    }

    /// Set the pause between embedding sub-batches.
    pub fn embedding_batch_delay(mut self, delay: Duration) -> Self {
        self.config.embedding_batch_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the vector store insert batch size.
    pub fn store_batch_size(mut self, size: usize) -> Self {
        self.config.store_batch_size = size;
        self
    }

    /// Set the default minimum similarity for search results.
    pub fn match_threshold(mut self, threshold: f32) -> Self {
        self.config.match_threshold = threshold;
        self
    }

    /// Set the default number of search results.
    pub fn match_count(mut self, count: usize) -> Self {
        self.config.match_count = count;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
