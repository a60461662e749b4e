use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tutor", version, about = "Knowledge-base retrieval and knowledge tracing for the tutor")]
pub struct Cli {
    /// Path to a TOML config file with [rag], [retry] and [bkt] tables
    #[arg(short, long, global = true, env = "TUTOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest every PDF, TXT and MD file under a directory
    Ingest {
        /// Knowledge-base root; first-level subdirectories become modules
        dir: PathBuf,

        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Search the knowledge base
    Search {
        query: String,

        /// Minimum cosine similarity (overrides config)
        #[arg(long)]
        threshold: Option<f32>,

        /// Maximum number of results (overrides config)
        #[arg(long)]
        count: Option<usize>,

        /// Restrict results to one module
        #[arg(long)]
        module: Option<String>,

        /// Print the formatted prompt context instead of a result list
        #[arg(long)]
        context: bool,

        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Knowledge tracing utilities
    Bkt {
        #[command(subcommand)]
        action: BktAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum BktAction {
    /// Replay an answer sequence and report the resulting knowledge state
    Simulate {
        /// Comma-separated answers: 1/0, y/n, true/false or correct/incorrect
        #[arg(long, value_delimiter = ',', value_parser = parse_answer, required = true)]
        answers: Vec<bool>,

        #[arg(long, default_value = "concept")]
        concept: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Credentials and endpoints for the embedding provider and vector store.
#[derive(Debug, Clone, Args)]
pub struct BackendArgs {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,

    /// Use PostgreSQL with pgvector instead of Supabase
    #[cfg(feature = "pgvector")]
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Disable retries on transient embedding failures
    #[arg(long)]
    pub no_retry: bool,
}

pub fn parse_answer(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "true" | "correct" | "c" => Ok(true),
        "0" | "n" | "no" | "false" | "incorrect" | "i" => Ok(false),
        other => Err(format!("'{other}' is not an answer; use 1/0, y/n or correct/incorrect")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_overrides() {
        let cli = Cli::try_parse_from([
            "tutor", "search", "what is ev?", "--threshold", "0.5", "--count", "3", "--module",
            "fundamentals", "--openai-api-key", "sk-test",
        ])
        .unwrap();

        match cli.command {
            Commands::Search { query, threshold, count, module, context, backend } => {
                assert_eq!(query, "what is ev?");
                assert_eq!(threshold, Some(0.5));
                assert_eq!(count, Some(3));
                assert_eq!(module.as_deref(), Some("fundamentals"));
                assert!(!context);
                assert_eq!(backend.openai_api_key.as_deref(), Some("sk-test"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_simulation_answers() {
        let cli =
            Cli::try_parse_from(["tutor", "bkt", "simulate", "--answers", "1,0,correct,n"]).unwrap();
        let Commands::Bkt { action: BktAction::Simulate { answers, concept, json } } = cli.command
        else {
            panic!("expected bkt simulate");
        };
        assert_eq!(answers, vec![true, false, true, false]);
        assert_eq!(concept, "concept");
        assert!(!json);
    }

    #[test]
    fn rejects_unknown_answers() {
        assert!(Cli::try_parse_from(["tutor", "bkt", "simulate", "--answers", "1,maybe"]).is_err());
        assert!(parse_answer(" Yes ").unwrap());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tutor", "ingest", "kb", "--config", "tutor.toml", "--log-json"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("tutor.toml")));
        assert!(cli.log_json);
    }
}
