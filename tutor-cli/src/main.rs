//! `tutor`: ingest a knowledge base, query it, and replay knowledge-tracing
//! sessions from the command line.

mod cli;
mod commands;
mod config;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tutor_rag::CancellationToken;

use crate::cli::{BktAction, Cli, Commands};
use crate::commands::SearchArgs;
use crate::config::TutorConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = TutorConfig::load(cli.config.as_deref()).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current batch");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Ingest { dir, backend } => {
            info!(dir = %dir.display(), "ingesting knowledge base");
            commands::ingest(&dir, &backend, &config, cancel).await
        }
        Commands::Search { query, threshold, count, module, context, backend } => {
            let args = SearchArgs { query, threshold, count, module, context };
            commands::search(args, &backend, &config, cancel).await
        }
        Commands::Bkt { action: BktAction::Simulate { answers, concept, json } } => {
            let report = commands::simulate(&concept, &answers, &config.bkt);
            commands::print_simulation(&report, json)
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
