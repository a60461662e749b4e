//! Query-time retrieval and prompt context formatting.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RagConfig;
use crate::document::SearchResult;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vectorstore::VectorStoreAdapter;

/// Context string returned when a search found nothing.
pub const NO_RESULTS_CONTEXT: &str = "No relevant documents found.";

/// Separator placed between formatted documents.
pub const CONTEXT_SEPARATOR: &str = "\n---\n\n";

/// Per-call search parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchOptions {
    pub match_threshold: f32,
    pub match_count: usize,
    /// Restrict results to one `module` metadata value.
    pub filter_module: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { match_threshold: 0.7, match_count: 5, filter_module: None }
    }
}

impl SearchOptions {
    /// Options carrying the search defaults from a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            match_threshold: config.match_threshold,
            match_count: config.match_count,
            filter_module: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.match_threshold = threshold;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.match_count = count;
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.filter_module = Some(module.into());
        self
    }
}

/// Embeds a query and retrieves the most similar chunks.
#[derive(Clone)]
pub struct SearchPipeline {
    embedder: Embedder,
    store: VectorStoreAdapter,
}

impl SearchPipeline {
    pub fn new(embedder: Embedder, store: VectorStoreAdapter) -> Self {
        Self { embedder, store }
    }

    /// Search the knowledge base. Results come back in the store's order
    /// (descending similarity); an empty list is a valid answer.
    ///
    /// # Errors
    ///
    /// Propagates embedding and vector store failures unchanged.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed_text(query).await?;
        let results = self
            .store
            .search(
                query_embedding,
                options.match_threshold,
                options.match_count,
                options.filter_module.as_deref(),
            )
            .await?;

        info!(
            result_count = results.len(),
            threshold = options.match_threshold,
            module = options.filter_module.as_deref(),
            "search completed"
        );
        Ok(results)
    }

    /// Search and render the results as prompt context in one step.
    pub async fn search_context(&self, query: &str, options: &SearchOptions) -> Result<String> {
        let results = self.search(query, options).await?;
        Ok(format_search_results_as_context(&results))
    }
}

/// Keep results whose similarity is at least `min`.
pub fn filter_by_min_similarity(results: &[SearchResult], min: f32) -> Vec<SearchResult> {
    results.iter().filter(|r| r.similarity >= min).cloned().collect()
}

/// The first `n` results in their existing order.
pub fn get_top_results(results: &[SearchResult], n: usize) -> Vec<SearchResult> {
    results.iter().take(n).cloned().collect()
}

/// Distinct topics in order of first appearance.
pub fn get_topics_from_results(results: &[SearchResult]) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();
    for result in results {
        if !topics.iter().any(|t| *t == result.metadata.topic) {
            topics.push(result.metadata.topic.clone());
        }
    }
    topics
}

/// Render results as a context block for the answer-generation prompt.
///
/// ```text
/// [Document 1] (Topic: EV, Similarity: 91.0%)
/// <content>
///
/// ---
///
/// [Document 2] (Topic: Bankroll, Similarity: 73.0%)
/// <content>
/// ```
///
/// Downstream prompt templates depend on this exact layout and on
/// [`NO_RESULTS_CONTEXT`] for an empty list.
pub fn format_search_results_as_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS_CONTEXT.to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            format!(
                "[Document {}] (Topic: {}, Similarity: {:.1}%)\n{}\n",
                i + 1,
                result.metadata.topic,
                f64::from(result.similarity) * 100.0,
                result.content
            )
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ChunkMetadata;

    fn result(id: &str, topic: &str, similarity: f32) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            content: format!("{topic} content"),
            metadata: ChunkMetadata { topic: topic.to_string(), ..Default::default() },
            similarity,
        }
    }

    #[test]
    fn empty_results_produce_sentinel() {
        assert_eq!(format_search_results_as_context(&[]), "No relevant documents found.");
    }

    #[test]
    fn formats_documents_in_order() {
        let results = vec![result("1", "EV", 0.91), result("2", "Bankroll", 0.73)];
        let context = format_search_results_as_context(&results);

        assert_eq!(
            context,
            "[Document 1] (Topic: EV, Similarity: 91.0%)\nEV content\n\
             \n---\n\n\
             [Document 2] (Topic: Bankroll, Similarity: 73.0%)\nBankroll content\n"
        );
    }

    #[test]
    fn filter_keeps_results_at_or_above_minimum() {
        let results = vec![result("1", "a", 0.9), result("2", "b", 0.75), result("3", "c", 0.5)];
        let kept = filter_by_min_similarity(&results, 0.75);
        let ids: Vec<_> = kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn top_results_preserve_order() {
        let results = vec![result("1", "a", 0.9), result("2", "b", 0.8), result("3", "c", 0.7)];
        let ids: Vec<_> = get_top_results(&results, 2).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(get_top_results(&results, 10).len(), 3);
    }

    #[test]
    fn topics_are_distinct_in_first_seen_order() {
        let results = vec![
            result("1", "EV", 0.9),
            result("2", "Bankroll", 0.8),
            result("3", "EV", 0.7),
            result("4", "Odds", 0.6),
        ];
        assert_eq!(get_topics_from_results(&results), vec!["EV", "Bankroll", "Odds"]);
    }
}
