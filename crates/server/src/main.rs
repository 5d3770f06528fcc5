mod api;
mod app_config;
mod router;
mod state;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

/// Chat with your PDFs: upload documents, ask questions answered from their text.
#[derive(Parser, Debug)]
#[command(name = "pdfrag", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default).
    Serve,
    /// Ingest a PDF from disk into the configured collection.
    Ingest {
        /// Path to the PDF file.
        path: PathBuf,
    },
    /// Ask a question against the configured collection.
    Ask {
        /// The question; multiple words are joined with spaces.
        #[arg(required = true)]
        question: Vec<String>,
    },
}

async fn serve(config: &pdfrag_core::Config) -> anyhow::Result<()> {
    let pipeline = app_config::build_pipeline(config).await?;
    let state = Arc::new(AppState::new(pipeline));
    let app = router::build_router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);
    info!("API docs at http://{}/docs", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ingest(config: &pdfrag_core::Config, path: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let pipeline = app_config::build_pipeline(config).await?;
    let report = pipeline.ingest(&filename, &bytes).await?;
    println!(
        "Ingested {}: {} pages, {} chunks into '{}'",
        report.source,
        report.pages,
        report.chunks,
        pipeline.settings().collection
    );
    Ok(())
}

async fn ask(config: &pdfrag_core::Config, question: &str) -> anyhow::Result<()> {
    let pipeline = app_config::build_pipeline(config).await?;
    let answer = pipeline.answer(question).await?;

    println!("{}", answer.answer);
    if !answer.sources.is_empty() {
        println!();
        println!("Sources:");
        for s in &answer.sources {
            println!(
                "  {} p.{} #{} (score {:.3})",
                s.source, s.page_number, s.chunk_index, s.score
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = app_config::load_config()?;
    config.log_summary();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await?,
        Command::Ingest { path } => ingest(&config, &path).await?,
        Command::Ask { question } => ask(&config, &question.join(" ")).await?,
    }

    Ok(())
}
