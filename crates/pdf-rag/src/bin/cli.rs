//! pdf-rag command line
//!
//! Run with: cargo run -p pdf-rag --features cli --bin pdf-rag -- ask "What is the refund policy?"

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_rag::types::MatchSummary;
use pdf_rag::{build_providers, IngestPipeline, QueryPipeline, RagConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ASK_SNIPPET_CHARS: usize = 200;
const SEARCH_SNIPPET_CHARS: usize = 300;

#[derive(Parser, Debug)]
#[command(name = "pdf-rag", version, about = "Ask questions about an ingested PDF")]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the number of chunks retrieved
    #[arg(long = "top-k", global = true)]
    top_k: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Retrieve, distill and answer
    Ask { question: String },
    /// Show the retrieved chunks only
    Search {
        question: String,
        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ingest a PDF into the vector store
    #[command(group(ArgGroup::new("input").required(true).args(["path", "url"])))]
    Ingest {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = pdf_rag::config::load_dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_rag=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = &dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let cli = Cli::parse();

    let mut config = RagConfig::load(cli.config.as_deref())?;
    if let Some(top_k) = cli.top_k {
        config.retrieval.top_k = top_k;
    }
    config.validate()?;

    let providers = build_providers(&config)?;

    match cli.command {
        Commands::Ask { question } => {
            let pipeline = QueryPipeline::from_providers(&config, &providers);
            let spinner = spinner("Retrieving and answering...")?;
            let result = pipeline.answer_question(&question).await;
            spinner.finish_and_clear();
            let result = result?;

            println!("{}", style("--- Retrieved Chunks ---").bold());
            for (i, chunk) in result.retrieved_chunks.iter().enumerate() {
                println!("[{}] {}", i + 1, snippet(chunk, ASK_SNIPPET_CHARS));
            }
            println!("\n{}", style("--- Answer ---").bold().green());
            println!("{}", result.answer);
        }
        Commands::Search { question, json } => {
            let pipeline = QueryPipeline::from_providers(&config, &providers);
            let spinner = spinner("Searching...")?;
            let matches = pipeline.search(&question).await;
            spinner.finish_and_clear();
            let matches = matches?;

            if json {
                let summaries: Vec<MatchSummary> = matches.iter().map(MatchSummary::from).collect();
                println!("{}", serde_json::to_string_pretty(&summaries)?);
                return Ok(());
            }

            if matches.is_empty() {
                println!("{}", style("No matches found.").yellow());
            }
            for m in &matches {
                println!(
                    "{} {:.4}  {} {}",
                    style("score").dim(),
                    m.score,
                    style("page").dim(),
                    m.metadata.page
                );
                println!("  {}\n", snippet(m.text(), SEARCH_SNIPPET_CHARS));
            }
        }
        Commands::Ingest { path, url } => {
            let pipeline = IngestPipeline::from_providers(&config, &providers)?;
            let spinner = spinner("Ingesting...")?;
            let report = match (path, url) {
                (Some(path), _) => pipeline.ingest_path(&path).await,
                (None, Some(url)) => pipeline.ingest_url(&url).await,
                (None, None) => anyhow::bail!("--path or --url is required"),
            };
            spinner.finish_and_clear();
            let report = report?;

            println!(
                "{} {} pages, {} chunks",
                style("Ingested").green().bold(),
                report.pages,
                report.chunks
            );
            println!("file id: {}", style(&report.file_id).cyan());
        }
    }

    Ok(())
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

/// Single-line preview of at most `max` characters
fn snippet(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}
