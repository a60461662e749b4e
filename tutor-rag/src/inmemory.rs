//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector store
//! backed by a `Vec` protected by a `tokio::sync::RwLock`. Search is exact
//! (every stored chunk is scored). It is suitable for development, testing,
//! and small knowledge bases.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{DocumentChunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{MatchQuery, VectorStore};

const BACKEND: &str = "InMemory";

#[derive(Debug)]
struct StoredChunk {
    id: String,
    chunk: DocumentChunk,
}

/// An in-memory vector store using cosine similarity for search.
///
/// Ids are assigned sequentially starting at 1, like a serial primary key.
///
/// # Example
///
/// ```rust,ignore
/// use tutor_rag::{InMemoryVectorStore, VectorStoreAdapter};
///
/// let adapter = VectorStoreAdapter::new(Arc::new(InMemoryVectorStore::new()));
/// adapter.store_chunks(&chunks).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    rows: RwLock<Vec<StoredChunk>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored chunks.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn insert(&self, chunks: &[DocumentChunk]) -> Result<()> {
        if chunks.iter().any(|c| c.embedding.is_none()) {
            return Err(RagError::vector_store(BACKEND, "chunk is missing its embedding"));
        }
        let mut rows = self.rows.write().await;
        for chunk in chunks {
            let id = (rows.len() + 1).to_string();
            rows.push(StoredChunk { id, chunk: chunk.clone() });
        }
        Ok(())
    }

    async fn match_documents(&self, query: &MatchQuery) -> Result<Vec<SearchResult>> {
        let rows = self.rows.read().await;

        let mut scored: Vec<SearchResult> = rows
            .iter()
            .filter(|row| {
                query.filter_module.as_deref().is_none_or(|module| row.chunk.metadata.module == module)
            })
            .filter_map(|row| {
                let embedding = row.chunk.embedding.as_deref()?;
                let similarity = cosine_similarity(embedding, &query.query_embedding);
                (similarity >= query.match_threshold).then(|| SearchResult {
                    id: row.id.clone(),
                    content: row.chunk.content.clone(),
                    metadata: row.chunk.metadata.clone(),
                    similarity,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(query.match_count);
        Ok(scored)
    }

    fn backend(&self) -> &str {
        BACKEND
    }
}
