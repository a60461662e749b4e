//! # tutor-rag
//!
//! Retrieval-augmented generation core for the tutor.
//!
//! ## Overview
//!
//! Knowledge-base files are loaded, split into overlapping passages,
//! embedded and written to a vector store by the [`IngestionPipeline`]. At
//! request time the [`SearchPipeline`] embeds the learner's question, asks
//! the store for the most similar passages above a threshold, and
//! [`format_search_results_as_context`] renders them into the context block
//! handed to the answer-generation model.
//!
//! Backends are pluggable behind two traits:
//!
//! - [`EmbeddingProvider`]: OpenAI (`openai` feature), or any custom provider
//! - [`VectorStore`]: Supabase (`supabase`), PostgreSQL/pgvector (`pgvector`),
//!   or [`InMemoryVectorStore`]
//!
//! Retries are opt-in through [`RetryingEmbeddingProvider`].

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod ingestion;
pub mod loader;
pub mod pipeline;
pub mod retry;
pub mod search;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pgvector")]
pub mod pgvector;
#[cfg(feature = "supabase")]
pub mod supabase;

pub use chunking::{Chunker, DEFAULT_SEPARATORS, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{ChunkMetadata, DocumentChunk, DocumentMetadata, SearchResult};
pub use embedding::{EMBEDDING_DIMENSIONS, EMBEDDING_MODEL, Embedder, EmbeddingProvider};
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use ingestion::{
    DocumentSource, IngestionFailure, IngestionPipeline, IngestionSummary, discover_documents,
};
pub use loader::{DocumentFormat, load_document};
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use retry::{RetryPolicy, RetryingEmbeddingProvider};
pub use search::{
    NO_RESULTS_CONTEXT, SearchOptions, SearchPipeline, filter_by_min_similarity,
    format_search_results_as_context, get_top_results, get_topics_from_results,
};
pub use vectorstore::{MatchQuery, VectorStore, VectorStoreAdapter};

pub use tokio_util::sync::CancellationToken;
