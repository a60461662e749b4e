//! Vector store trait and the batching [`VectorStoreAdapter`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::document::{DocumentChunk, SearchResult};
use crate::error::{RagError, Result};

/// Parameters of a server-side similarity search.
///
/// Field names match the arguments of the `match_documents` procedure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchQuery {
    pub query_embedding: Vec<f32>,
    pub match_threshold: f32,
    pub match_count: usize,
    pub filter_module: Option<String>,
}

/// A storage backend for embedded chunks with similarity search.
///
/// Implementations delegate ranking to the backend: results come back with
/// `similarity >= match_threshold`, ordered by descending similarity, at
/// most `match_count` of them.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert one batch of chunks. Every chunk must carry an embedding.
    async fn insert(&self, chunks: &[DocumentChunk]) -> Result<()>;

    /// Run the backend's nearest-neighbour search.
    async fn match_documents(&self, query: &MatchQuery) -> Result<Vec<SearchResult>>;

    /// A short name used in logs and errors.
    fn backend(&self) -> &str;
}

/// Writes chunks in bounded batches and forwards searches to a [`VectorStore`].
///
/// Storage is not transactional across batches: when a batch fails, the
/// batches before it stay persisted and no further batches are attempted.
#[derive(Clone)]
pub struct VectorStoreAdapter {
    store: Arc<dyn VectorStore>,
    batch_size: usize,
    cancel: CancellationToken,
}

impl VectorStoreAdapter {
    /// Create an adapter with the default batch size (100).
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store, batch_size: 100, cancel: CancellationToken::new() }
    }

    /// Set the maximum number of chunks per insert.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Use a cancellation token checked between insert batches.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Persist chunks batch by batch, stopping at the first failure.
    pub async fn store_chunks(&self, chunks: &[DocumentChunk]) -> Result<()> {
        if let Some(index) = chunks.iter().position(|c| c.embedding.is_none()) {
            return Err(RagError::vector_store(
                self.store.backend(),
                format!("chunk {index} has no embedding"),
            ));
        }

        let batch_count = chunks.len().div_ceil(self.batch_size);
        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                return Err(RagError::Cancelled);
            }
            self.store.insert(batch).await.map_err(|e| {
                error!(
                    backend = self.store.backend(),
                    batch = batch_index + 1,
                    batch_count,
                    error = %e,
                    "insert batch failed"
                );
                e
            })?;
            debug!(
                backend = self.store.backend(),
                batch = batch_index + 1,
                batch_count,
                batch_size = batch.len(),
                "stored batch"
            );
        }

        info!(backend = self.store.backend(), chunk_count = chunks.len(), "stored chunks");
        Ok(())
    }

    /// Find up to `count` chunks with similarity at least `threshold`,
    /// optionally restricted to one module. An empty result is not an error.
    pub async fn search(
        &self,
        query_embedding: Vec<f32>,
        threshold: f32,
        count: usize,
        module_filter: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let query = MatchQuery {
            query_embedding,
            match_threshold: threshold,
            match_count: count,
            filter_module: module_filter.map(str::to_string),
        };
        let results = self.store.match_documents(&query).await.map_err(|e| {
            error!(backend = self.store.backend(), error = %e, "similarity search failed");
            e
        })?;
        debug!(backend = self.store.backend(), result_count = results.len(), "similarity search");
        Ok(results)
    }
}
