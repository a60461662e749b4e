//! Data types for document metadata, chunks, and search results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata supplied by the caller for a whole source document.
///
/// `source`, `module` and `topic` are required. Anything else goes in
/// `extra`, which is flattened into the same JSON object on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DocumentMetadata {
    /// Where the document came from (usually a relative file path).
    pub source: String,
    /// The course module the document belongs to.
    pub module: String,
    /// The topic covered by the document.
    pub topic: String,
    /// Optional author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Optional publication date, kept as the caller supplied it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Additional key-value pairs.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl DocumentMetadata {
    /// Create metadata with the three required fields.
    pub fn new(
        source: impl Into<String>,
        module: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            module: module.into(),
            topic: topic.into(),
            ..Default::default()
        }
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Add an extra key-value pair.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Metadata attached to every stored chunk: the parent document's metadata
/// plus the chunk's position within that document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChunkMetadata {
    pub source: String,
    pub module: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Zero-based position of the chunk within its document.
    #[serde(default)]
    pub chunk_index: usize,
    /// Number of chunks the document was split into.
    #[serde(default)]
    pub total_chunks: usize,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ChunkMetadata {
    /// Derive chunk metadata from the parent document's metadata.
    pub fn for_chunk(document: &DocumentMetadata, chunk_index: usize, total_chunks: usize) -> Self {
        Self {
            source: document.source.clone(),
            module: document.module.clone(),
            topic: document.topic.clone(),
            author: document.author.clone(),
            date: document.date.clone(),
            chunk_index,
            total_chunks,
            extra: document.extra.clone(),
        }
    }
}

/// A contiguous passage of a source document.
///
/// `embedding` is `None` until the ingestion pipeline attaches one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    /// The passage text. Never empty.
    pub content: String,
    pub metadata: ChunkMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl DocumentChunk {
    /// Create a chunk without an embedding.
    pub fn new(content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self { content: content.into(), metadata, embedding: None }
    }
}

/// A chunk retrieved for a query, paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Store-assigned identifier of the chunk.
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    /// Cosine-similarity-derived score; higher is more relevant.
    pub similarity: f32,
}
