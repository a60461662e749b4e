//! End-to-end ingestion and search against the in-memory store.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tutor_rag::{
    DocumentMetadata, DocumentSource, EmbeddingProvider, InMemoryVectorStore, RagConfig, RagError,
    RagPipeline, SearchOptions, format_search_results_as_context, get_topics_from_results,
};

/// Maps text onto one axis per keyword so similarities are predictable.
/// Texts containing "FAIL" make the provider error out.
struct KeywordEmbeddingProvider;

const KEYWORDS: [&str; 3] = ["expected value", "bankroll", "pot odds"];

#[async_trait]
impl EmbeddingProvider for KeywordEmbeddingProvider {
    async fn embed(&self, text: &str) -> tutor_rag::Result<Vec<f32>> {
        if text.contains("FAIL") {
            return Err(RagError::embedding("keyword", "API returned 400 Bad Request: rejected input"));
        }
        let lower = text.to_lowercase();
        let mut embedding = vec![0.0; KEYWORDS.len() + 1];
        match KEYWORDS.iter().position(|k| lower.contains(k)) {
            Some(axis) => embedding[axis] = 1.0,
            None => embedding[KEYWORDS.len()] = 1.0,
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        KEYWORDS.len() + 1
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

fn pipeline(store: Arc<InMemoryVectorStore>, config: RagConfig) -> RagPipeline {
    RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(KeywordEmbeddingProvider))
        .vector_store(store)
        .build()
        .unwrap()
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

#[tokio::test(start_paused = true)]
async fn ingests_directory_and_answers_queries() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "fundamentals/ev.md", "# EV\n\nExpected value is the probability-weighted average.");
    write(root, "bankroll/bankroll.txt", "Your bankroll should cover swings.");
    write(root, "images/chart.png", "binary");

    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline(store.clone(), RagConfig::default());

    let summary = pipeline.ingestion().ingest_directory(root).await.unwrap();
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.total_chunks, 2);
    assert_eq!(store.len().await, 2);

    let results = pipeline.search("What is expected value?").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].metadata.module, "fundamentals");
    assert_eq!(results[0].metadata.topic, "ev");
    assert!((results[0].similarity - 1.0).abs() < 1e-6);

    let context = format_search_results_as_context(&results);
    assert!(context.starts_with("[Document 1] (Topic: ev, Similarity: 100.0%)\n# EV"));
}

#[tokio::test(start_paused = true)]
async fn unrelated_query_yields_sentinel_context() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline(store, RagConfig::default());
    pipeline
        .ingestion()
        .ingest_text("Bankroll management basics.", &DocumentMetadata::new("b.txt", "bankroll", "Bankroll"))
        .await
        .unwrap();

    let context = pipeline.search_context("How do pot odds work?").await.unwrap();
    assert_eq!(context, "No relevant documents found.");
}

#[tokio::test(start_paused = true)]
async fn attaches_chunk_positions() {
    let store = Arc::new(InMemoryVectorStore::new());
    let config = RagConfig::builder().chunk_size(40).chunk_overlap(10).build().unwrap();
    let pipeline = pipeline(store, config);
    let text = "Expected value one. Expected value two. Expected value three. Expected value four.";

    let count = pipeline
        .ingestion()
        .ingest_text(text, &DocumentMetadata::new("ev.md", "fundamentals", "EV").with_author("coach"))
        .await
        .unwrap();
    assert!(count > 1);

    let options = SearchOptions::default().with_count(100);
    let results = pipeline.search_with("expected value", &options).await.unwrap();
    assert_eq!(results.len(), count);

    let mut indices: Vec<usize> = results.iter().map(|r| r.metadata.chunk_index).collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..count).collect::<Vec<_>>());
    assert!(results.iter().all(|r| r.metadata.total_chunks == count));
    assert!(results.iter().all(|r| r.metadata.author.as_deref() == Some("coach")));
}

#[tokio::test(start_paused = true)]
async fn module_filter_restricts_results() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline(store, RagConfig::default());
    let ingestion = pipeline.ingestion();
    ingestion
        .ingest_text("Bankroll for cash games.", &DocumentMetadata::new("a", "cash", "Bankroll"))
        .await
        .unwrap();
    ingestion
        .ingest_text("Bankroll for tournaments.", &DocumentMetadata::new("b", "mtt", "Bankroll"))
        .await
        .unwrap();

    let options = SearchOptions::default().with_module("mtt");
    let results = pipeline.search_with("bankroll", &options).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content, "Bankroll for tournaments.");
    assert_eq!(get_topics_from_results(&results), vec!["Bankroll"]);
}

#[tokio::test(start_paused = true)]
async fn batch_ingestion_continues_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "good.md", "Pot odds compare the price to the pot.");
    write(root, "bad.txt", "This text will FAIL to embed.");
    write(root, "slides.docx", "not supported");

    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline(store.clone(), RagConfig::default());
    let sources: Vec<DocumentSource> = ["bad.txt", "slides.docx", "good.md"]
        .iter()
        .map(|name| DocumentSource {
            path: root.join(name),
            metadata: DocumentMetadata::new(*name, "general", *name),
        })
        .collect();

    let summary = pipeline.ingestion().ingest_batch(&sources).await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.total_chunks, 1);
    assert!(summary.failures[0].error.contains("Embedding error"));
    assert!(summary.failures[1].error.contains("Unsupported document format"));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn single_document_errors_propagate() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline(store.clone(), RagConfig::default());

    let err = pipeline
        .ingestion()
        .ingest(Path::new("notes.docx"), &DocumentMetadata::new("notes.docx", "general", "notes"))
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::UnsupportedFormat { .. }));

    let err = pipeline.search("FAIL").await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingError { .. }));
    assert!(store.is_empty().await);
}

#[test]
fn builder_requires_provider_and_store() {
    let err = RagPipeline::builder().vector_store(Arc::new(InMemoryVectorStore::new())).build();
    assert!(matches!(err, Err(RagError::ConfigError(_))));

    let err = RagPipeline::builder().embedding_provider(Arc::new(KeywordEmbeddingProvider)).build();
    assert!(matches!(err, Err(RagError::ConfigError(_))));
}
