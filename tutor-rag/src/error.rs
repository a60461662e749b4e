//! Error types for the `tutor-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while ingesting or searching the knowledge base.
#[derive(Debug, Error)]
pub enum RagError {
    /// The document's file extension is not one of `pdf`, `txt` or `md`.
    #[error("Unsupported document format '{extension}' for {}", path.display())]
    UnsupportedFormat {
        /// The offending path.
        path: PathBuf,
        /// The extension found on the path (empty if none).
        extension: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The document could be read but its text could not be extracted.
    #[error("Failed to load {}: {message}", path.display())]
    DocumentLoad {
        /// The document path.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The operation was cancelled between batches.
    #[error("Operation cancelled")]
    Cancelled,

    /// An I/O error while reading a document.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Build an [`RagError::EmbeddingError`] for the given provider.
    pub fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingError { provider: provider.into(), message: message.into() }
    }

    /// Build a [`RagError::VectorStoreError`] for the given backend.
    pub fn vector_store(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VectorStoreError { backend: backend.into(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
