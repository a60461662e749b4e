use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use tutor_bkt::{
    BktParameters, DEFAULT_MASTERY_THRESHOLD, Difficulty, LearningInsights, StudentKnowledge,
    has_mastered, initialize_knowledge, learning_insights_with, next_review_date_from,
    predict_correctness, record_answer, recommended_difficulty, review_interval_days,
};
use tutor_rag::openai::OpenAIEmbeddingProvider;
use tutor_rag::supabase::SupabaseVectorStore;
use tutor_rag::{
    CancellationToken, EmbeddingProvider, RagPipeline, RetryingEmbeddingProvider, SearchOptions,
    SearchResult, VectorStore, format_search_results_as_context,
};

use crate::cli::BackendArgs;
use crate::config::TutorConfig;

pub async fn ingest(
    dir: &Path,
    backend: &BackendArgs,
    config: &TutorConfig,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let pipeline = build_pipeline(backend, config, cancel).await?;
    let summary = pipeline.ingestion().ingest_directory(dir).await?;

    for failure in &summary.failures {
        println!("failed: {} ({})", failure.path.display(), failure.error);
    }
    println!("{summary}");
    Ok(())
}

pub struct SearchArgs {
    pub query: String,
    pub threshold: Option<f32>,
    pub count: Option<usize>,
    pub module: Option<String>,
    pub context: bool,
}

pub async fn search(
    args: SearchArgs,
    backend: &BackendArgs,
    config: &TutorConfig,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let pipeline = build_pipeline(backend, config, cancel).await?;

    let mut options = SearchOptions::from_config(&config.rag);
    if let Some(threshold) = args.threshold {
        options = options.with_threshold(threshold);
    }
    if let Some(count) = args.count {
        options = options.with_count(count);
    }
    if let Some(module) = args.module {
        options = options.with_module(module);
    }

    let results = pipeline.search_with(&args.query, &options).await?;
    if args.context {
        println!("{}", format_search_results_as_context(&results));
    } else {
        print_results(&results);
    }
    Ok(())
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("(no results)");
        return;
    }
    for (i, result) in results.iter().enumerate() {
        let preview: String = result.content.chars().take(80).collect();
        println!(
            "{}. [{:.3}] {}/{} ({})\n   {}",
            i + 1,
            result.similarity,
            result.metadata.module,
            result.metadata.topic,
            result.metadata.source,
            preview.replace('\n', " "),
        );
    }
}

async fn build_pipeline(
    backend: &BackendArgs,
    config: &TutorConfig,
    cancel: CancellationToken,
) -> anyhow::Result<RagPipeline> {
    let api_key = backend
        .openai_api_key
        .clone()
        .context("an OpenAI API key is required (--openai-api-key or OPENAI_API_KEY)")?;
    let openai = OpenAIEmbeddingProvider::new(api_key)?;
    let provider: Arc<dyn EmbeddingProvider> = if backend.no_retry {
        Arc::new(openai)
    } else {
        Arc::new(RetryingEmbeddingProvider::new(openai, config.retry.clone()))
    };

    let store = vector_store(backend).await?;
    info!(backend = store.backend(), embedding = provider.name(), "pipeline ready");

    Ok(RagPipeline::builder()
        .config(config.rag.clone())
        .embedding_provider(provider)
        .vector_store(store)
        .cancellation_token(cancel)
        .build()?)
}

async fn vector_store(backend: &BackendArgs) -> anyhow::Result<Arc<dyn VectorStore>> {
    #[cfg(feature = "pgvector")]
    {
        if let Some(url) = backend.database_url.as_deref() {
            let store = tutor_rag::pgvector::PgVectorStore::new(url).await?;
            store.ensure_schema(tutor_rag::EMBEDDING_DIMENSIONS).await?;
            return Ok(Arc::new(store));
        }
    }

    let url = backend
        .supabase_url
        .as_deref()
        .context("a Supabase URL is required (--supabase-url or SUPABASE_URL)")?;
    let key = backend
        .supabase_key
        .as_deref()
        .context("a Supabase service-role key is required (SUPABASE_SERVICE_ROLE_KEY)")?;
    Ok(Arc::new(SupabaseVectorStore::new(url, key)?))
}

/// One replayed answer.
#[derive(Debug, Serialize)]
pub struct SimulationStep {
    pub attempt: u32,
    pub correct: bool,
    pub p_ln: f64,
    pub difficulty: Difficulty,
    pub predicted_next: f64,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub knowledge: StudentKnowledge,
    pub steps: Vec<SimulationStep>,
    pub mastered: bool,
    pub insights: LearningInsights,
    pub review_in_days: u32,
    pub next_review: DateTime<Utc>,
}

pub fn simulate(concept_id: &str, answers: &[bool], params: &BktParameters) -> SimulationReport {
    let mut knowledge = initialize_knowledge(concept_id, params);
    let mut steps = Vec::with_capacity(answers.len());

    for &correct in answers {
        knowledge = record_answer(&knowledge, correct, params);
        steps.push(SimulationStep {
            attempt: knowledge.attempts,
            correct,
            p_ln: knowledge.p_ln,
            difficulty: recommended_difficulty(&knowledge),
            predicted_next: predict_correctness(&knowledge, params),
        });
    }

    SimulationReport {
        mastered: has_mastered(&knowledge, DEFAULT_MASTERY_THRESHOLD),
        insights: learning_insights_with(&knowledge, params),
        review_in_days: review_interval_days(&knowledge),
        next_review: next_review_date_from(&knowledge, knowledge.last_updated),
        steps,
        knowledge,
    }
}

pub fn print_simulation(report: &SimulationReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{:>7}  {:>7}  {:>6}  {:>9}  difficulty", "attempt", "answer", "P(Ln)", "P(next)");
    for step in &report.steps {
        println!(
            "{:>7}  {:>7}  {:>6.3}  {:>9.3}  {}",
            step.attempt,
            if step.correct { "correct" } else { "wrong" },
            step.p_ln,
            step.predicted_next,
            step.difficulty,
        );
    }
    println!();
    println!("status:      {} (P(Ln) = {:.3})", report.insights.status, report.insights.confidence);
    println!("mastered:    {}", report.mastered);
    println!("to mastery:  ~{} more attempts", report.insights.estimated_attempts_to_mastery);
    println!(
        "next review: in {} day(s), {}",
        report.review_in_days,
        report.next_review.format("%Y-%m-%d")
    );
    println!("{}", report.insights.recommendation);
    Ok(())
}
