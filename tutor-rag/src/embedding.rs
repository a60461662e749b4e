//! Embedding provider trait and the batching [`Embedder`] built on top of it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::RagConfig;
use crate::error::{RagError, Result};

/// The embedding model used for both documents and queries.
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Dimensionality of vectors produced by [`EMBEDDING_MODEL`].
pub const EMBEDDING_DIMENSIONS: usize = 1536;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// Providers are constructed once at startup and shared through an
/// `Arc<dyn EmbeddingProvider>`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A short name used in logs and errors.
    fn name(&self) -> &str {
        "embedding"
    }
}

/// Splits large embedding requests into bounded sub-batches.
///
/// Sub-batches are sent one after another with `batch_delay` between them to
/// stay under upstream rate limits. The first failing sub-batch aborts the
/// whole call; partial results are discarded. The cancellation token is
/// checked before every sub-batch.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    batch_delay: Duration,
    cancel: CancellationToken,
}

impl Embedder {
    /// Create an embedder with the default batch size (100) and delay (100 ms).
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::from_config(provider, &RagConfig::default())
    }

    /// Create an embedder using the batch settings from a [`RagConfig`].
    pub fn from_config(provider: Arc<dyn EmbeddingProvider>, config: &RagConfig) -> Self {
        Self {
            provider,
            batch_size: config.embedding_batch_size.max(1),
            batch_delay: config.embedding_batch_delay(),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the maximum number of texts per provider request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the pause between sub-batches.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Use a cancellation token checked between sub-batches.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Embed a single text, typically a search query.
    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.provider.embed(text).await?;
        self.check_dimensions(&embedding)?;
        Ok(embedding)
    }

    /// Embed many texts, returning one vector per input in input order.
    pub async fn embed_texts<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        let batch_count = texts.len().div_ceil(self.batch_size);

        for (batch_index, batch) in texts.chunks(self.batch_size).enumerate() {
            if batch_index > 0 && !self.batch_delay.is_zero() {
                tokio::select! {
                    _ = self.cancel.cancelled() => return Err(RagError::Cancelled),
                    _ = tokio::time::sleep(self.batch_delay) => {}
                }
            }
            if self.cancel.is_cancelled() {
                return Err(RagError::Cancelled);
            }

            let inputs: Vec<&str> = batch.iter().map(|text| text.as_ref()).collect();
            debug!(
                provider = self.provider.name(),
                batch = batch_index + 1,
                batch_count,
                batch_size = inputs.len(),
                "embedding sub-batch"
            );

            let vectors = self.provider.embed_batch(&inputs).await?;
            if vectors.len() != inputs.len() {
                error!(
                    provider = self.provider.name(),
                    expected = inputs.len(),
                    got = vectors.len(),
                    "embedding count mismatch"
                );
                return Err(RagError::embedding(
                    self.provider.name(),
                    format!("expected {} embeddings, got {}", inputs.len(), vectors.len()),
                ));
            }
            for vector in &vectors {
                self.check_dimensions(vector)?;
            }
            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }

    fn check_dimensions(&self, embedding: &[f32]) -> Result<()> {
        let expected = self.provider.dimensions();
        if embedding.len() != expected {
            return Err(RagError::embedding(
                self.provider.name(),
                format!("expected {expected}-dimensional embedding, got {}", embedding.len()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Encodes the first byte of each text into a 4-dim vector and records
    /// the size of every batch it receives.
    struct RecordingProvider {
        batches: Mutex<Vec<usize>>,
        fail_on_batch: Option<usize>,
    }

    impl RecordingProvider {
        fn new(fail_on_batch: Option<usize>) -> Self {
            Self { batches: Mutex::new(Vec::new()), fail_on_batch }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for RecordingProvider {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let first = text.bytes().next().unwrap_or(0) as f32;
            Ok(vec![first, 0.0, 0.0, 1.0])
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            let index = {
                let mut batches = self.batches.lock().unwrap();
                batches.push(texts.len());
                batches.len()
            };
            if self.fail_on_batch == Some(index) {
                return Err(RagError::embedding("recording", "quota exceeded"));
            }
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            4
        }
    }

    #[tokio::test(start_paused = true)]
    async fn splits_into_bounded_batches_and_keeps_order() {
        let provider = Arc::new(RecordingProvider::new(None));
        let embedder = Embedder::new(provider.clone()).with_batch_size(3);
        let texts: Vec<String> = (b'a'..=b'h').map(|b| (b as char).to_string()).collect();

        let vectors = embedder.embed_texts(&texts).await.unwrap();

        assert_eq!(*provider.batches.lock().unwrap(), vec![3, 3, 2]);
        let firsts: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        let expected: Vec<f32> = (b'a'..=b'h').map(|b| b as f32).collect();
        assert_eq!(firsts, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_sub_batch_aborts_the_call() {
        let provider = Arc::new(RecordingProvider::new(Some(2)));
        let embedder = Embedder::new(provider.clone()).with_batch_size(2);
        let texts = ["a", "b", "c", "d", "e"];

        let err = embedder.embed_texts(&texts).await.unwrap_err();

        assert!(matches!(err, RagError::EmbeddingError { .. }));
        assert_eq!(provider.batches.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_sub_batches() {
        let provider = Arc::new(RecordingProvider::new(None));
        let embedder = Embedder::new(provider)
            .with_batch_size(1)
            .with_batch_delay(Duration::from_millis(250));

        let start = tokio::time::Instant::now();
        embedder.embed_texts(&["a", "b", "c"]).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_first_batch() {
        let provider = Arc::new(RecordingProvider::new(None));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let embedder = Embedder::new(provider.clone()).with_cancellation(cancel);

        let err = embedder.embed_texts(&["a"]).await.unwrap_err();

        assert!(matches!(err, RagError::Cancelled));
        assert!(provider.batches.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_delay_skips_next_batch() {
        let provider = Arc::new(RecordingProvider::new(None));
        let cancel = CancellationToken::new();
        let embedder = Embedder::new(provider.clone())
            .with_batch_size(1)
            .with_batch_delay(Duration::from_secs(10))
            .with_cancellation(cancel.clone());

        let (result, ()) = tokio::join!(embedder.embed_texts(&["a", "b", "c"]), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        });

        assert!(matches!(result, Err(RagError::Cancelled)));
        assert_eq!(*provider.batches.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn rejects_wrong_dimensionality() {
        struct ShortProvider;

        #[async_trait]
        impl EmbeddingProvider for ShortProvider {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Ok(vec![1.0])
            }

            fn dimensions(&self) -> usize {
                EMBEDDING_DIMENSIONS
            }
        }

        let embedder = Embedder::new(Arc::new(ShortProvider));
        let err = embedder.embed_text("query").await.unwrap_err();
        assert!(err.to_string().contains("1536-dimensional"));
    }

    #[tokio::test]
    async fn empty_input_makes_no_requests() {
        let provider = Arc::new(RecordingProvider::new(None));
        let embedder = Embedder::new(provider.clone());
        let texts: [&str; 0] = [];

        assert!(embedder.embed_texts(&texts).await.unwrap().is_empty());
        assert!(provider.batches.lock().unwrap().is_empty());
    }
}
