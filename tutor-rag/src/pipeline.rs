//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] wires one [`EmbeddingProvider`] and one
//! [`VectorStore`] into an [`IngestionPipeline`] and a [`SearchPipeline`]
//! that share them. Both are constructed once at startup and passed to
//! whatever needs them.
//!
//! # Example
//!
//! ```rust,ignore
//! use tutor_rag::{RagPipeline, RagConfig, InMemoryVectorStore};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! pipeline.ingestion().ingest_directory(Path::new("knowledge-base")).await?;
//! let context = pipeline.search_context("what is expected value?").await?;
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::document::SearchResult;
use crate::embedding::{Embedder, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::ingestion::IngestionPipeline;
use crate::search::{SearchOptions, SearchPipeline};
use crate::vectorstore::{VectorStore, VectorStoreAdapter};

/// The RAG pipeline orchestrator. Construct one via [`RagPipeline::builder()`].
#[derive(Clone)]
pub struct RagPipeline {
    config: RagConfig,
    ingestion: IngestionPipeline,
    search: SearchPipeline,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn ingestion(&self) -> &IngestionPipeline {
        &self.ingestion
    }

    pub fn searcher(&self) -> &SearchPipeline {
        &self.search
    }

    /// Search with the configured default threshold and count.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.search.search(query, &SearchOptions::from_config(&self.config)).await
    }

    /// Search with explicit options.
    pub async fn search_with(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        self.search.search(query, options).await
    }

    /// Search with the configured defaults and format the results as prompt context.
    pub async fn search_context(&self, query: &str) -> Result<String> {
        self.search.search_context(query, &SearchOptions::from_config(&self.config)).await
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `embedding_provider` and `vector_store` are required. The config
/// defaults to [`RagConfig::default()`], the chunker to a
/// [`RecursiveChunker`] sized from the config.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    cancel: Option<CancellationToken>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Replace the default chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Share a cancellation token with the batching stages.
    pub fn cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Build the [`RagPipeline`], validating the config and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or
    /// the config is inconsistent.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.unwrap_or_else(|| Arc::new(RecursiveChunker::from_config(&config)));
        let cancel = self.cancel.unwrap_or_default();

        let embedder =
            Embedder::from_config(embedding_provider, &config).with_cancellation(cancel.clone());
        let store = VectorStoreAdapter::new(vector_store)
            .with_batch_size(config.store_batch_size)
            .with_cancellation(cancel);

        Ok(RagPipeline {
            ingestion: IngestionPipeline::new(chunker, embedder.clone(), store.clone()),
            search: SearchPipeline::new(embedder, store),
            config,
        })
    }
}
