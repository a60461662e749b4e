//! Knowledge-base ingestion: load → chunk → embed → store.
//!
//! A single document either fails as a whole or reports its chunk count.
//! Batch ingestion keeps going after a failed document and reports an
//! [`IngestionSummary`] at the end.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::chunking::Chunker;
use crate::document::{ChunkMetadata, DocumentChunk, DocumentMetadata};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::loader::{is_supported, load_document};
use crate::vectorstore::VectorStoreAdapter;

/// Module assigned to files that sit directly in the knowledge-base root.
pub const DEFAULT_MODULE: &str = "general";

/// A file to ingest together with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSource {
    pub path: PathBuf,
    pub metadata: DocumentMetadata,
}

/// A document that failed during batch ingestion.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IngestionFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of ingesting several documents.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct IngestionSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub total_chunks: usize,
    pub failures: Vec<IngestionFailure>,
}

impl IngestionSummary {
    /// Total number of documents attempted.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

impl fmt::Display for IngestionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} documents ingested, {} failed, {} chunks stored",
            self.succeeded,
            self.total(),
            self.failed,
            self.total_chunks
        )
    }
}

/// Composes a [`Chunker`], an [`Embedder`] and a [`VectorStoreAdapter`].
#[derive(Clone)]
pub struct IngestionPipeline {
    chunker: Arc<dyn Chunker>,
    embedder: Embedder,
    store: VectorStoreAdapter,
}

impl IngestionPipeline {
    pub fn new(chunker: Arc<dyn Chunker>, embedder: Embedder, store: VectorStoreAdapter) -> Self {
        Self { chunker, embedder, store }
    }

    /// Ingest one file and return the number of chunks stored.
    ///
    /// # Errors
    ///
    /// Returns the first error from loading, embedding or storing. If
    /// storage fails partway, batches written before the failure remain.
    pub async fn ingest(&self, path: &Path, metadata: &DocumentMetadata) -> Result<usize> {
        let text = load_document(path).await?;
        self.ingest_text(&text, metadata).await
    }

    /// Ingest already-loaded text and return the number of chunks stored.
    pub async fn ingest_text(&self, text: &str, metadata: &DocumentMetadata) -> Result<usize> {
        let contents = self.chunker.split_text(text);
        if contents.is_empty() {
            info!(document.source = %metadata.source, chunk_count = 0, "ingested document (empty)");
            return Ok(0);
        }

        let embeddings = self.embedder.embed_texts(&contents).await.map_err(|e| {
            error!(document.source = %metadata.source, error = %e, "embedding failed during ingestion");
            e
        })?;

        let total_chunks = contents.len();
        let chunks: Vec<DocumentChunk> = contents
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (content, embedding))| DocumentChunk {
                content,
                metadata: ChunkMetadata::for_chunk(metadata, index, total_chunks),
                embedding: Some(embedding),
            })
            .collect();

        self.store.store_chunks(&chunks).await.map_err(|e| {
            error!(document.source = %metadata.source, error = %e, "storage failed during ingestion");
            e
        })?;

        info!(document.source = %metadata.source, chunk_count = total_chunks, "ingested document");
        Ok(total_chunks)
    }

    /// Ingest several documents, continuing past per-document failures.
    ///
    /// Cancellation stops the batch; the cancelled document is recorded as
    /// a failure and the rest are not attempted.
    pub async fn ingest_batch(&self, documents: &[DocumentSource]) -> IngestionSummary {
        let mut summary = IngestionSummary::default();

        for document in documents {
            match self.ingest(&document.path, &document.metadata).await {
                Ok(chunk_count) => {
                    summary.succeeded += 1;
                    summary.total_chunks += chunk_count;
                }
                Err(e) => {
                    warn!(path = %document.path.display(), error = %e, "skipping document");
                    summary.failed += 1;
                    let cancelled = matches!(e, RagError::Cancelled);
                    summary
                        .failures
                        .push(IngestionFailure { path: document.path.clone(), error: e.to_string() });
                    if cancelled {
                        break;
                    }
                }
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            total_chunks = summary.total_chunks,
            "batch ingestion finished"
        );
        summary
    }

    /// Discover every supported file under `root` and ingest them all.
    ///
    /// # Errors
    ///
    /// Only fails if `root` is not a readable directory; per-document
    /// failures are reported in the summary.
    pub async fn ingest_directory(&self, root: &Path) -> Result<IngestionSummary> {
        let documents = discover_documents(root)?;
        info!(root = %root.display(), document_count = documents.len(), "ingesting knowledge base");
        Ok(self.ingest_batch(&documents).await)
    }
}

/// Walk a knowledge-base directory and derive metadata for each supported file.
///
/// `module` is the first directory below `root` ([`DEFAULT_MODULE`] for
/// files directly in `root`), `topic` is the file stem with `-` and `_`
/// turned into spaces, and `source` is the path relative to `root`.
pub fn discover_documents(root: &Path) -> Result<Vec<DocumentSource>> {
    if !root.is_dir() {
        return Err(RagError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        )));
    }

    let mut paths = WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            let supported = is_supported(path);
            if !supported {
                debug!(path = %path.display(), "skipping unsupported file");
            }
            supported
        })
        .collect::<Vec<_>>();
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|path| {
            let metadata = metadata_for_path(root, &path);
            DocumentSource { path, metadata }
        })
        .collect())
}

fn metadata_for_path(root: &Path, path: &Path) -> DocumentMetadata {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut components = relative.components();
    let module = if relative.components().count() > 1 {
        components
            .next()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_MODULE.to_string())
    } else {
        DEFAULT_MODULE.to_string()
    };
    let topic = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().replace(['-', '_'], " "))
        .unwrap_or_default();

    DocumentMetadata::new(relative.to_string_lossy().replace('\\', "/"), module, topic)
}
