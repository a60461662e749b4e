//! Opt-in retry with exponential backoff for embedding providers.
//!
//! Nothing in the pipelines retries on its own. Operators who want
//! resilience wrap their provider once at startup:
//!
//! ```rust,ignore
//! let provider = Arc::new(RetryingEmbeddingProvider::new(
//!     OpenAIEmbeddingProvider::from_env()?,
//!     RetryPolicy::default(),
//! ));
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Retry behaviour for transient provider failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub backoff_base_ms: u64,
    /// Cap for the backoff delay in milliseconds.
    pub backoff_max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, backoff_base_ms: 500, backoff_max_ms: 30_000 }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let delay = self.backoff_base_ms.saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(delay.min(self.backoff_max_ms))
    }
}

/// Whether an error is worth retrying: rate limits, timeouts and server errors.
/// Configuration and client errors (4xx other than 429) are not.
pub fn is_retryable(err: &RagError) -> bool {
    let RagError::EmbeddingError { message, .. } = err else {
        return false;
    };
    if let Some(status) = response_status(message) {
        return status == 429 || (500..600).contains(&status);
    }
    let lower = message.to_lowercase();
    lower.contains("timeout") || lower.contains("timed out") || lower.contains("request failed")
}

/// The HTTP status from an `API returned <status>: ...` message.
fn response_status(message: &str) -> Option<u16> {
    let rest = message.strip_prefix("API returned ")?;
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// An [`EmbeddingProvider`] that retries transient failures of an inner provider.
pub struct RetryingEmbeddingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: EmbeddingProvider> RetryingEmbeddingProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for RetryingEmbeddingProvider<P> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut attempt = 0;
        loop {
            match self.inner.embed(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(e) if attempt < self.policy.max_retries && is_retryable(&e) => {
                    let delay = self.policy.backoff(attempt);
                    warn!(provider = self.inner.name(), attempt, ?delay, error = %e, "retrying embedding");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut attempt = 0;
        loop {
            match self.inner.embed_batch(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) if attempt < self.policy.max_retries && is_retryable(&e) => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        provider = self.inner.name(),
                        attempt,
                        batch_size = texts.len(),
                        ?delay,
                        error = %e,
                        "retrying embedding batch"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
