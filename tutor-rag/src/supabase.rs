//! Supabase (PostgREST) vector store backend.
//!
//! Inserts rows into a `documents` table and searches through the
//! `match_documents` RPC, which ranks rows server-side with pgvector.
//!
//! This module is only available when the `supabase` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use tutor_rag::supabase::SupabaseVectorStore;
//!
//! let store = SupabaseVectorStore::from_env()?;
//! let adapter = VectorStoreAdapter::new(Arc::new(store));
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::{ChunkMetadata, DocumentChunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{MatchQuery, VectorStore};

const BACKEND: &str = "Supabase";

/// A [`VectorStore`] backed by a Supabase project's REST API.
pub struct SupabaseVectorStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
    match_function: String,
}

impl SupabaseVectorStore {
    /// Create a store for the project at `url` using a service-role key.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let url = url.into();
        if url.is_empty() || api_key.is_empty() {
            return Err(RagError::vector_store(BACKEND, "URL and API key must not be empty"));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: url.trim_end_matches('/').to_string(),
            api_key,
            table: "documents".to_string(),
            match_function: "match_documents".to_string(),
        })
    }

    /// Create a store from `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("SUPABASE_URL").map_err(|_| {
            RagError::vector_store(BACKEND, "SUPABASE_URL environment variable not set")
        })?;
        let key = std::env::var("SUPABASE_SERVICE_ROLE_KEY").map_err(|_| {
            RagError::vector_store(BACKEND, "SUPABASE_SERVICE_ROLE_KEY environment variable not set")
        })?;
        Self::new(url, key)
    }

    /// Use a different table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Use a different search procedure name.
    pub fn with_match_function(mut self, function: impl Into<String>) -> Self {
        self.match_function = function.into();
        self
    }

    /// Apply a per-request timeout. No timeout is set by default.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagError::vector_store(BACKEND, format!("failed to build client: {e}")))?;
        Ok(self)
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/rest/v1/{path}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<PostgrestError>(&body).map(|e| e.message).unwrap_or(body);
        error!(backend = BACKEND, %status, action, "API error");
        Err(RagError::vector_store(BACKEND, format!("{action} returned {status}: {detail}")))
    }
}

#[derive(Serialize)]
struct InsertRow<'a> {
    content: &'a str,
    metadata: &'a ChunkMetadata,
    embedding: &'a [f32],
}

#[derive(Deserialize)]
struct MatchRow {
    id: serde_json::Value,
    content: String,
    metadata: ChunkMetadata,
    similarity: f64,
}

#[derive(Deserialize)]
struct PostgrestError {
    message: String,
}

impl From<MatchRow> for SearchResult {
    fn from(row: MatchRow) -> Self {
        let id = match row.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        SearchResult { id, content: row.content, metadata: row.metadata, similarity: row.similarity as f32 }
    }
}

fn insert_rows(chunks: &[DocumentChunk]) -> Result<Vec<InsertRow<'_>>> {
    chunks
        .iter()
        .map(|chunk| {
            let embedding = chunk
                .embedding
                .as_deref()
                .ok_or_else(|| RagError::vector_store(BACKEND, "chunk is missing its embedding"))?;
            Ok(InsertRow { content: &chunk.content, metadata: &chunk.metadata, embedding })
        })
        .collect()
}

#[async_trait]
impl VectorStore for SupabaseVectorStore {
    async fn insert(&self, chunks: &[DocumentChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let rows = insert_rows(chunks)?;

        let response = self
            .request(&self.table)
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await
            .map_err(|e| {
                error!(backend = BACKEND, error = %e, "insert request failed");
                RagError::vector_store(BACKEND, format!("insert request failed: {e}"))
            })?;
        Self::check(response, "insert").await?;

        debug!(backend = BACKEND, table = %self.table, count = chunks.len(), "inserted rows");
        Ok(())
    }

    async fn match_documents(&self, query: &MatchQuery) -> Result<Vec<SearchResult>> {
        let response = self
            .request(&format!("rpc/{}", self.match_function))
            .json(query)
            .send()
            .await
            .map_err(|e| {
                error!(backend = BACKEND, error = %e, "search request failed");
                RagError::vector_store(BACKEND, format!("search request failed: {e}"))
            })?;
        let response = Self::check(response, "search").await?;

        let rows: Vec<MatchRow> = response.json().await.map_err(|e| {
            error!(backend = BACKEND, error = %e, "failed to parse search response");
            RagError::vector_store(BACKEND, format!("failed to parse search response: {e}"))
        })?;

        Ok(rows.into_iter().map(SearchResult::from).collect())
    }

    fn backend(&self) -> &str {
        BACKEND
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rpc_body_uses_procedure_argument_names() {
        let query = MatchQuery {
            query_embedding: vec![0.5, 0.25],
            match_threshold: 0.75,
            match_count: 5,
            filter_module: Some("fundamentals".into()),
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "query_embedding": [0.5, 0.25],
                "match_threshold": 0.75,
                "match_count": 5,
                "filter_module": "fundamentals"
            })
        );
    }

    #[test]
    fn parses_numeric_ids() {
        let row: MatchRow = serde_json::from_value(json!({
            "id": 42,
            "content": "EV is the average outcome.",
            "metadata": {"source": "ev.md", "module": "fundamentals", "topic": "EV"},
            "similarity": 0.91
        }))
        .unwrap();
        let result = SearchResult::from(row);
        assert_eq!(result.id, "42");
        assert_eq!(result.metadata.topic, "EV");
    }

    #[test]
    fn insert_rows_require_embeddings() {
        let chunk = DocumentChunk::new("text", ChunkMetadata::default());
        assert!(insert_rows(&[chunk]).is_err());
    }
}
